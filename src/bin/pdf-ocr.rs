//! CLI binary for edgequake-pdf-ocr.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `OcrConfig` and writes the extracted text.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_ocr::{
    extract, write_output, ExtractionOutput, ExtractionProgressCallback, OcrConfig,
    PageSelection, ProgressCallback, DEFAULT_DPI, DEFAULT_MODEL, DEFAULT_SERVER_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar on stderr plus one line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the page currently in flight. Pages run one at a time.
    page_started: Mutex<Option<Instant>>,
    empties: AtomicUsize,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_extraction_start` tells us how many pages there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Rendering");
        bar.set_message("Converting PDF to images…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            empties: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self) -> String {
        let secs = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut slot) = self.page_started.lock() {
            *slot = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, _total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {:<12}  {}",
            green("✓"),
            page_num,
            dim(&format!("{text_len:>5} chars")),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_page_empty(&self, page_num: usize, _total: usize) {
        self.empties.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}  {}  {}",
            yellow("∅"),
            page_num,
            yellow("no text"),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, _total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Keep one line per page.
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}  {}  {}",
            red("✗"),
            page_num,
            red(&msg),
            self.page_elapsed(),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, extracted_count: usize) {
        self.bar.finish_and_clear();

        let empty = self.empties.load(Ordering::SeqCst);
        let failed = self.errors.load(Ordering::SeqCst);
        if extracted_count == total_pages {
            eprintln!(
                "{} text extracted from {} pages",
                green("✔"),
                bold(&extracted_count.to_string())
            );
        } else {
            eprintln!(
                "{} text extracted from {}/{} pages  ({} empty, {} failed)",
                if extracted_count == 0 { red("✘") } else { yellow("⚠") },
                bold(&extracted_count.to_string()),
                total_pages,
                empty,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to stdout with the default model and server
  pdf-ocr scan.pdf

  # Write to a file
  pdf-ocr scan.pdf -o scan.txt

  # Local Ollama, another vision model
  pdf-ocr --server http://localhost:11434/api/generate --model llama3.2-vision scan.pdf

  # First five pages at a higher resolution
  pdf-ocr --pages 1-5 --dpi 300 scan.pdf

  # Per-page results and timings as JSON
  pdf-ocr --json scan.pdf > scan.json

ENVIRONMENT VARIABLES:
  PDF_OCR_MODEL        Default for --model
  PDF_OCR_SERVER       Default for --server
  PDF_OCR_OUTPUT       Default for --output
  PDF_OCR_DPI          Default for --dpi
  PDF_OCR_PAGES        Default for --pages
  PDF_OCR_PASSWORD     Default for --password
  PDF_OCR_PROMPT_FILE  Default for --prompt-file
  PDFIUM_LIB_PATH      Path to libpdfium (file or directory)
  RUST_LOG             Log filter, overrides -v / -q

PDFium is looked up at PDFIUM_LIB_PATH, then in the current directory,
then on the system library path.
"#;

/// Extract the text of a PDF page by page with a vision model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-ocr",
    version,
    about = "Extract text from PDF files using a vision model served by Ollama",
    long_about = "Render every page of a PDF to an image, send each image to a vision-capable \
model through Ollama's /api/generate endpoint and print the recognised text, one \
\"--- Page N ---\" block per page. Pages that fail or come back empty are skipped.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input PDF file.
    pdf_file: PathBuf,

    /// Vision model to request.
    #[arg(long, env = "PDF_OCR_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Inference endpoint URL.
    #[arg(long, env = "PDF_OCR_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Write the text to this file instead of stdout.
    #[arg(short, long, env = "PDF_OCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDF_OCR_DPI", default_value_t = DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF_OCR_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_OCR_PASSWORD")]
    password: Option<String>,

    /// Path to a text file whose content replaces the default prompt.
    #[arg(long, env = "PDF_OCR_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Output structured JSON (text, per-page results, stats) instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress everything on stderr except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The bar replaces the per-page info lines, so only warnings and errors
    // are interleaved with it.
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli, progress_cb).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract(&cli.pdf_file, &config)
        .await
        .with_context(|| format!("Failed to extract text from {}", cli.pdf_file.display()))?;

    let content = render_content(&output, cli.json)?;

    if let Some(ref output_path) = cli.output {
        write_output(output_path, &content)
            .await
            .context("Failed to write output")?;
        if let Some(line) = write_confirmation(output_path, cli.quiet) {
            eprintln!("{line}");
        }
    } else {
        // Exactly the bytes a file would get, no newline appended.
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(content.as_bytes())
            .and_then(|_| handle.flush())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Stderr line confirming the output file, unless `--quiet` was given.
fn write_confirmation(path: &Path, quiet: bool) -> Option<String> {
    (!quiet).then(|| format!("Output written to {}", path.display()))
}

/// Plain text, or the whole `ExtractionOutput` as pretty JSON.
fn render_content(output: &ExtractionOutput, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(output).context("Failed to serialise output")
    } else {
        Ok(output.text.clone())
    }
}

/// Map CLI args to `OcrConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = OcrConfig::builder()
        .model(cli.model.clone())
        .server_url(cli.server.clone())
        .dpi(cli.dpi)
        .pages(pages);

    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` (`all`, `5`, `3-15` or `1,3,5`) into a `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let spec = s.trim().to_lowercase();

    if spec == "all" {
        return Ok(PageSelection::All);
    }
    if let Some((first, last)) = spec.split_once('-') {
        let (first, last) = (page_number(first)?, page_number(last)?);
        if first > last {
            anyhow::bail!("--pages {first}-{last}: the range runs backwards");
        }
        return Ok(PageSelection::Range(first, last));
    }
    if spec.contains(',') {
        let pages = spec.split(',').map(page_number).collect::<Result<Vec<_>>>()?;
        return Ok(PageSelection::Set(pages));
    }
    Ok(PageSelection::Single(page_number(&spec)?))
}

/// One 1-based page number from a `--pages` value.
fn page_number(token: &str) -> Result<usize> {
    let token = token.trim();
    let page: usize = token
        .parse()
        .with_context(|| format!("--pages: '{token}' is not a page number"))?;
    if page == 0 {
        anyhow::bail!("--pages: page numbers start at 1, got 0");
    }
    Ok(page)
}
