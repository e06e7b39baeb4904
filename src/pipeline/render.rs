//! PDF rasterisation: render the selected pages to `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to call from async contexts. The whole render runs
//! on a blocking-pool thread and hands back owned images.
//!
//! Rendering is all-or-nothing: a document that fails to load, or any page
//! that fails to rasterise, aborts the run with an [`OcrError`]. No partial
//! set of pages is ever returned.

use crate::config::OcrConfig;
use crate::error::OcrError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an explicit libpdfium to load.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Output of the renderer.
pub struct RenderedDocument {
    /// Page count of the whole document.
    pub total_pages: usize,
    /// `(page_index_0based, image)` in ascending page order.
    pub pages: Vec<(usize, DynamicImage)>,
}

/// Rasterise the pages selected by `config.pages`.
pub async fn render_pages(pdf_path: &Path, config: &OcrConfig) -> Result<RenderedDocument, OcrError> {
    let path = pdf_path.to_path_buf();
    let scale = config.dpi as f32 / 72.0;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let selection = config.pages.clone();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        render_pages_blocking(&pdfium, &path, scale, max_pixels, password.as_deref(), |total| {
            selection.to_indices(total)
        })
        .and_then(|doc| {
            if doc.pages.is_empty() {
                Err(OcrError::PageOutOfRange {
                    page: selection.first_requested(),
                    total: doc.total_pages,
                })
            } else {
                Ok(doc)
            }
        })
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Render task panicked: {}", e)))?
}

/// Load libpdfium.
///
/// `PDFIUM_LIB_PATH` wins when set; otherwise the working directory is tried
/// before the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, OcrError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.is_empty() => {
            debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, path);
            if Path::new(&path).is_dir() {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&path))
            } else {
                Pdfium::bind_to_library(&path)
            }
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| OcrError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdfium: &Pdfium,
    pdf_path: &Path,
    scale: f32,
    max_pixels: u32,
    password: Option<&str>,
    select: impl FnOnce(usize) -> Vec<usize>,
) -> Result<RenderedDocument, OcrError> {
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| classify_load_error(pdf_path, password.is_some(), format!("{:?}", e)))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let indices = select(total_pages);
    let mut results = Vec::with_capacity(indices.len());

    for idx in indices {
        let page = pages
            .get(idx as u16)
            .map_err(|e| OcrError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| OcrError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push((idx, image));
    }

    Ok(RenderedDocument {
        total_pages,
        pages: results,
    })
}

/// Map a pdfium load failure onto the matching fatal error.
fn classify_load_error(pdf_path: &Path, had_password: bool, detail: String) -> OcrError {
    let path = pdf_path.to_path_buf();
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            OcrError::WrongPassword { path }
        } else {
            OcrError::PasswordRequired { path }
        }
    } else {
        OcrError::CorruptPdf { path, detail }
    }
}
