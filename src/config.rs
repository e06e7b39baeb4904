//! Configuration types for PDF text extraction.
//!
//! Every knob lives in [`OcrConfig`], built via its [`OcrConfigBuilder`].
//! Defaults are named constants rather than ambient state, so a library
//! caller and the CLI start from exactly the same values.

use crate::error::OcrError;
use crate::pipeline::inference::OcrEngine;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_OCR_PROMPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Model requested from the inference server when none is given.
pub const DEFAULT_MODEL: &str = "gemma3:27b";

/// Ollama `generate` endpoint used when none is given.
pub const DEFAULT_SERVER_URL: &str = "http://10.147.17.205:11434/api/generate";

/// Rendering resolution. Matches the usual poppler/pdf2image default.
pub const DEFAULT_DPI: u32 = 200;

/// Configuration for a PDF text extraction run.
///
/// Built via [`OcrConfig::builder()`] or using [`OcrConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf_ocr::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .model("llama3.2-vision")
///     .server_url("http://localhost:11434/api/generate")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "llama3.2-vision");
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// Model identifier sent in every request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Full URL of the inference endpoint. Default: [`DEFAULT_SERVER_URL`].
    pub server_url: String,

    /// Instruction sent alongside each page image. Default: [`DEFAULT_OCR_PROMPT`].
    pub prompt: String,

    /// Rendering DPI. Range: 72–600. Default: 200.
    ///
    /// Vision models read small print noticeably better at 200 DPI than at
    /// screen resolution; going much higher mostly inflates the request body.
    pub dpi: u32,

    /// Cap on either rendered dimension in pixels. Default: 5000.
    ///
    /// Keeps a poster-sized page from producing a gigantic bitmap.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Pre-constructed engine. Takes precedence over `server_url` / `model`.
    pub engine: Option<Arc<dyn OcrEngine>>,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            prompt: DEFAULT_OCR_PROMPT.to_string(),
            dpi: DEFAULT_DPI,
            max_rendered_pixels: 5000,
            password: None,
            pages: PageSelection::default(),
            engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("model", &self.model)
            .field("server_url", &self.server_url)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// `model` and `server_url` are passed through untouched: a bad value
    /// makes each page's request fail and the page is skipped, like any
    /// other server-side problem.
    pub fn build(self) -> Result<OcrConfig, OcrError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(OcrError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.prompt.trim().is_empty() {
            return Err(OcrError::InvalidConfig("Prompt must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Specifies which pages of the PDF to send for extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page, in document order (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// The selected pages that exist in a `total_pages` document, as sorted,
    /// deduplicated 0-based indices. Pages past the end are dropped.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let in_document = |p: &usize| (1..=total_pages).contains(p);
        let mut pages: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => Some(*p).into_iter().filter(in_document).collect(),
            PageSelection::Range(first, last) => ((*first).max(1)..=(*last).min(total_pages)).collect(),
            PageSelection::Set(pages) => pages.iter().copied().filter(in_document).collect(),
        };
        pages.sort_unstable();
        pages.dedup();
        pages.into_iter().map(|p| p - 1).collect()
    }

    /// Page number to report when the selection is empty for a document.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}
