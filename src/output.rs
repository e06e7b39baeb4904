//! Result types produced by an extraction run.

use crate::error::PageError;
use serde::{Deserialize, Serialize};

/// Outcome for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number in the source document.
    pub page_num: usize,
    /// Text returned by the model. Empty when nothing was extracted.
    pub text: String,
    /// Wall-clock time spent encoding and waiting for the server.
    pub duration_ms: u64,
    /// Set when the page could not be encoded or the request failed.
    pub error: Option<PageError>,
}

impl PageResult {
    /// Whether this page contributes a block to the final text.
    pub fn has_text(&self) -> bool {
        self.error.is_none() && !self.text.is_empty()
    }

    /// The labelled block written to the output for this page.
    pub fn block(&self) -> String {
        format!("--- Page {} ---\n{}\n", self.page_num, self.text)
    }
}

/// Counters and timings for a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the PDF.
    pub total_pages: usize,
    /// Pages sent through the pipeline (after page selection).
    pub selected_pages: usize,
    /// Pages that produced text.
    pub extracted_pages: usize,
    /// Pages where the server answered with no text.
    pub empty_pages: usize,
    /// Pages that failed to encode or whose request failed.
    pub failed_pages: usize,
    pub render_duration_ms: u64,
    pub inference_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Labelled page blocks joined in page order.
    pub text: String,
    /// One entry per selected page, in page order.
    pub pages: Vec<PageResult>,
    pub stats: ExtractionStats,
}
