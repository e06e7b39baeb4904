//! Pipeline stages for PDF text extraction.
//!
//! Each submodule implements exactly one transformation step and can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ inference
//! (path)    (pdfium)   (base64)   (Ollama)
//! ```
//!
//! 1. [`input`]     — check the user-supplied path exists, is readable and is a PDF
//! 2. [`render`]    — rasterise the selected pages; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`encode`]    — PNG-encode and base64-wrap each `DynamicImage`
//! 4. [`inference`] — one HTTP request per page; the only stage with network I/O

pub mod encode;
pub mod inference;
pub mod input;
pub mod render;
