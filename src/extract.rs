//! Pipeline driver: validate → render → (encode → infer) per page → assemble.
//!
//! Pages go through the inference server strictly one at a time and in
//! page order. A page that fails (encoding error, transport error, non-2xx
//! status, undecodable body) or comes back empty is logged and left out of
//! the output; the remaining pages are still processed. Only input and
//! rendering problems abort the run.

use crate::config::OcrConfig;
use crate::error::{OcrError, PageError};
use crate::output::{ExtractionOutput, ExtractionStats, PageResult};
use crate::pipeline::inference::{OcrEngine, OllamaClient};
use crate::pipeline::render::RenderedDocument;
use crate::pipeline::{encode, input, render};
use image::DynamicImage;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Extract the text of every selected page of the PDF at `input`.
///
/// # Returns
/// `Ok(ExtractionOutput)` whenever the document could be rendered, even if
/// some or all pages yielded no text (see `output.stats`).
///
/// # Errors
/// Returns `Err(OcrError)` only for fatal problems: missing or unreadable
/// input, not a PDF, pdfium unavailable, rendering failure, or a page
/// selection that matches nothing. Input validation happens before any
/// rendering or network traffic.
pub async fn extract(
    input_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ExtractionOutput, OcrError> {
    let total_start = Instant::now();
    let pdf_path = input::resolve_input(input_path)?;
    info!("Starting extraction: {}", pdf_path.display());

    let engine = resolve_engine(config)?;

    info!("Converting PDF to images...");
    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    debug!(
        "Rendered {} pages in {}ms",
        rendered.pages.len(),
        render_duration_ms
    );

    let mut output = run(&engine, rendered, config).await;
    output.stats.render_duration_ms = render_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Run the per-page part of the pipeline over pages that are already rendered.
///
/// Useful when the caller rasterises pages itself, or to drive the pipeline
/// without pdfium.
pub async fn extract_rendered(
    rendered: RenderedDocument,
    config: &OcrConfig,
) -> Result<ExtractionOutput, OcrError> {
    let total_start = Instant::now();
    let engine = resolve_engine(config)?;
    let mut output = run(&engine, rendered, config).await;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    Ok(output)
}

/// Extract and write the text to `output_path` (overwriting it).
pub async fn extract_to_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ExtractionOutput, OcrError> {
    let output = extract(input_path, config).await?;
    write_output(output_path.as_ref(), &output.text).await?;
    Ok(output)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_path: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<ExtractionOutput, OcrError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| OcrError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_path, config))
}

/// Extract text from PDF bytes held in memory.
///
/// pdfium needs a file path, so the bytes go to a managed temp file that is
/// removed when this function returns.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &OcrConfig,
) -> Result<ExtractionOutput, OcrError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| OcrError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| OcrError::Internal(format!("tempfile write: {e}")))?;
    tmp.flush()
        .map_err(|e| OcrError::Internal(format!("tempfile flush: {e}")))?;
    extract(tmp.path(), config).await
}

/// Write `content` to `path`, replacing any existing file.
///
/// Goes through a sibling temp file and a rename so a crash never leaves a
/// half-written output behind.
pub async fn write_output(path: &Path, content: &str) -> Result<(), OcrError> {
    let write_err = |source| OcrError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = temp_sibling(path);
    tokio::fs::write(&tmp_path, content).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

/// Send each page through `engine` in order.
///
/// Always returns one [`PageResult`] per input page; failures are recorded,
/// never propagated.
pub async fn process_pages(
    engine: &Arc<dyn OcrEngine>,
    pages: &[(usize, DynamicImage)],
    config: &OcrConfig,
) -> Vec<PageResult> {
    let total = pages.len();
    let last_page = pages.last().map(|(idx, _)| idx + 1).unwrap_or(0);
    info!("Processing {} page(s)...", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(total);
    }

    let mut results = Vec::with_capacity(total);
    for (idx, image) in pages {
        let page_num = idx + 1;
        info!("Processing page {}/{}...", page_num, last_page);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total);
        }

        let result = process_page(engine, page_num, image, &config.prompt).await;

        if !result.has_text() {
            warn!("No text extracted from page {}", page_num);
        }
        if let Some(ref cb) = config.progress_callback {
            match &result.error {
                Some(e) => cb.on_page_error(page_num, total, &e.to_string()),
                None if result.text.is_empty() => cb.on_page_empty(page_num, total),
                None => cb.on_page_complete(page_num, total, result.text.len()),
            }
        }

        results.push(result);
    }

    if let Some(ref cb) = config.progress_callback {
        let extracted = results.iter().filter(|r| r.has_text()).count();
        cb.on_extraction_complete(total, extracted);
    }

    results
}

/// Join the labelled blocks of every page that produced text, in page order.
///
/// Each block ends with a newline and blocks are separated by one more, so
/// consecutive pages are divided by a blank line.
pub fn assemble_text(pages: &[PageResult]) -> String {
    pages
        .iter()
        .filter(|p| p.has_text())
        .map(PageResult::block)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A pre-built engine from the config wins; otherwise talk to Ollama.
fn resolve_engine(config: &OcrConfig) -> Result<Arc<dyn OcrEngine>, OcrError> {
    if let Some(ref engine) = config.engine {
        return Ok(Arc::clone(engine));
    }
    Ok(Arc::new(OllamaClient::from_config(config)?))
}

async fn run(
    engine: &Arc<dyn OcrEngine>,
    rendered: RenderedDocument,
    config: &OcrConfig,
) -> ExtractionOutput {
    let inference_start = Instant::now();
    let pages = process_pages(engine, &rendered.pages, config).await;
    let inference_duration_ms = inference_start.elapsed().as_millis() as u64;

    let text = assemble_text(&pages);

    let failed = pages.iter().filter(|p| p.error.is_some()).count();
    let extracted = pages.iter().filter(|p| p.has_text()).count();
    let stats = ExtractionStats {
        total_pages: rendered.total_pages,
        selected_pages: pages.len(),
        extracted_pages: extracted,
        empty_pages: pages.len() - extracted - failed,
        failed_pages: failed,
        render_duration_ms: 0,
        inference_duration_ms,
        total_duration_ms: 0,
    };

    info!(
        "Extraction complete: text from {}/{} pages ({} empty, {} failed)",
        extracted, stats.selected_pages, stats.empty_pages, failed
    );

    ExtractionOutput { text, pages, stats }
}

/// Encode one page and ask the engine for its text.
async fn process_page(
    engine: &Arc<dyn OcrEngine>,
    page_num: usize,
    image: &DynamicImage,
    prompt: &str,
) -> PageResult {
    let start = Instant::now();

    let outcome = match encode::encode_page(image) {
        Ok(encoded) => engine.extract_text(&encoded, prompt).await.map_err(|e| {
            error!(
                "Error calling {} inference server for page {}: {}",
                engine.name(),
                page_num,
                e
            );
            PageError::InferenceFailed {
                page: page_num,
                detail: e.to_string(),
            }
        }),
        Err(e) => {
            error!("Failed to encode page {}: {}", page_num, e);
            Err(PageError::EncodeFailed {
                page: page_num,
                detail: e.to_string(),
            })
        }
    };

    let (text, error) = match outcome {
        Ok(text) => (text, None),
        Err(e) => (String::new(), Some(e)),
    };

    PageResult {
        page_num,
        text,
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
