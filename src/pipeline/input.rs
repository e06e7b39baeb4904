//! Input validation: make sure the user-supplied path is a readable PDF.
//!
//! This runs before the renderer is bound or any request is sent, so a typo
//! in the path fails fast with a clear message instead of a pdfium error.

use crate::error::OcrError;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate `path` and return it as an owned `PathBuf`.
///
/// Checks, in order: the file exists, it is a regular file, it can be
/// opened, and (when it has at least four bytes) it starts with `%PDF`.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, OcrError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(OcrError::FileNotFound { path });
    }
    if !path.is_file() {
        return Err(OcrError::NotAFile { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(OcrError::NotAPdf { path, magic });
            }
        }
        Err(e) => return Err(open_error(path, e)),
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Map a failed `File::open` onto the matching input error.
fn open_error(path: PathBuf, err: std::io::Error) -> OcrError {
    match err.kind() {
        ErrorKind::NotFound => OcrError::FileNotFound { path },
        ErrorKind::PermissionDenied => OcrError::PermissionDenied { path },
        _ => OcrError::InputUnreadable { path, source: err },
    }
}
