//! Error types for the edgequake-pdf-ocr library.
//!
//! Failures fall into two tiers:
//!
//! * [`OcrError`] — **Fatal**: the run cannot proceed at all (missing input,
//!   unreadable or corrupt PDF, pdfium unavailable). Returned as
//!   `Err(OcrError)` from the top-level `extract*` functions; the binary maps
//!   it to exit status 1.
//!
//! * [`PageError`] — **Non-fatal**: one page could not be encoded or the
//!   inference server did not answer for it. Stored inside
//!   [`crate::output::PageResult`]; the page contributes no text and the run
//!   continues with the next page.
//!
//! [`InferenceError`] is what an [`crate::pipeline::inference::OcrEngine`]
//! returns. The driver logs it and folds it into a [`PageError`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-ocr library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File '{path}' not found")]
    FileNotFound { path: PathBuf },

    /// Path exists but is a directory or other non-file.
    #[error("'{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but opening it failed for another reason.
    #[error("Could not read '{path}': {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("Error converting PDF '{path}': {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium returned an error while rasterising a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it on the system library path,\n\
or set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Inference client errors ───────────────────────────────────────────
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// The page is left out of the final text; every other page is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The rendered image could not be serialised as PNG.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The inference server could not be reached or rejected the request.
    #[error("Page {page}: inference request failed: {detail}")]
    InferenceFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::EncodeFailed { page, .. } | PageError::InferenceFailed { page, .. } => *page,
        }
    }
}

/// Failure of a single inference call.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Connection refused, DNS failure, broken pipe and the like.
    #[error("request to '{endpoint}' failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON object we expect.
    #[error("could not decode response body: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_names_the_path() {
        let e = OcrError::FileNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert_eq!(e.to_string(), "File '/tmp/missing.pdf' not found");
    }

    #[test]
    fn page_out_of_range_display() {
        let e = OcrError::PageOutOfRange { page: 9, total: 4 };
        let msg = e.to_string();
        assert!(msg.contains("Page 9"), "got: {msg}");
        assert!(msg.contains("4 pages"), "got: {msg}");
    }

    #[test]
    fn page_error_reports_its_page() {
        let e = PageError::InferenceFailed {
            page: 3,
            detail: "server returned HTTP 500: boom".into(),
        };
        assert_eq!(e.page(), 3);
        assert!(e.to_string().starts_with("Page 3:"));
    }

    #[test]
    fn status_error_display() {
        let e = InferenceError::Status {
            status: 503,
            body: "model is loading".into(),
        };
        assert_eq!(e.to_string(), "server returned HTTP 503: model is loading");
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::EncodeFailed {
            page: 1,
            detail: "zero-sized image".into(),
        };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("EncodeFailed"), "got: {json}");
    }
}
