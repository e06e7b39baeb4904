//! # edgequake-pdf-ocr
//!
//! Extract the text of a PDF by showing each page to a vision model.
//!
//! Scanned documents have no text layer for `pdftotext` to read. This crate
//! rasterises every page, sends the image to a vision-capable model served
//! over HTTP (Ollama's `/api/generate` by default) and stitches the answers
//! together, one labelled block per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   check the path exists and starts with %PDF
//!  ├─ 2. Render  rasterise pages via pdfium (spawn_blocking)
//!  ├─ 3. Encode  PNG → base64
//!  ├─ 4. Infer   one POST per page, strictly in page order
//!  └─ 5. Output  "--- Page N ---" blocks joined by blank lines
//! ```
//!
//! Input and rendering failures are fatal. A page whose request fails or
//! whose answer is empty is logged and skipped; the run carries on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_ocr::{extract, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OcrConfig::builder()
//!         .server_url("http://localhost:11434/api/generate")
//!         .build()?;
//!     let output = extract("scan.pdf", &config).await?;
//!     print!("{}", output.text);
//!     eprintln!("{} of {} pages had text",
//!         output.stats.extracted_pages,
//!         output.stats.selected_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-ocr` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    OcrConfig, OcrConfigBuilder, PageSelection, DEFAULT_DPI, DEFAULT_MODEL, DEFAULT_SERVER_URL,
};
pub use error::{InferenceError, OcrError, PageError};
pub use extract::{
    assemble_text, extract, extract_from_bytes, extract_rendered, extract_sync, extract_to_file,
    process_pages, write_output,
};
pub use output::{ExtractionOutput, ExtractionStats, PageResult};
pub use pipeline::encode::EncodedImage;
pub use pipeline::inference::{OcrEngine, OllamaClient};
pub use pipeline::render::RenderedDocument;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::DEFAULT_OCR_PROMPT;
