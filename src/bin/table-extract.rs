//! CLI binary for table-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and writes CSV or JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use table_extract::{
    extract_tables, parse_page_spec, tables_to_csv, tables_to_json, write_csv, BackendKind,
    ExtractionConfig, ExtractionProgressCallback, PageSet, Table,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr that turns into a page counter once the backend knows
/// how many pages it will process.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: std::sync::Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("opening input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: std::sync::Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, backend: &str, total_pages: usize) {
        self.bar.set_prefix(backend.to_string());
        if total_pages == 0 {
            self.bar.set_message("running…");
            return;
        }
        self.bar.set_length(total_pages as u64);
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, tables_found: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{tables_found} table(s)")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, _tables_found: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # First table of a PDF, docling backend (stdout)
  table-extract report.pdf

  # Every table on pages 1-3 and 5, written to a file
  table-extract --pages 1-3,5 --all-tables report.pdf -o tables.csv

  # Local vision model through Ollama
  table-extract --backend ollama --model gemma3 scan.png

  # Ruled tables with tesseract, JSON output
  table-extract --backend img2table --json invoice.pdf

  # Which backends can run here?
  table-extract --list-backends

ENVIRONMENT VARIABLES:
  TABLE_EXTRACT_BACKEND    Default backend
  TABLE_EXTRACT_MODEL      Vision model name
  OLLAMA_HOST              Ollama endpoint (default http://localhost:11434)
  TABLE_EXTRACT_OCR_LANG   Tesseract language (default eng)
  PDFIUM_LIB_PATH          Path to libpdfium, or the directory holding it
  RUST_LOG                 Log filter, overrides -v / -q
"#;

/// Extract tables from PDFs and images into CSV.
#[derive(Parser, Debug)]
#[command(
    name = "table-extract",
    version,
    about = "Extract tables from PDFs and images into CSV",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or image file.
    #[arg(required_unless_present = "list_backends")]
    input: Option<PathBuf>,

    /// Write CSV to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction backend.
    #[arg(long, env = "TABLE_EXTRACT_BACKEND", value_enum, default_value = "document-pipeline")]
    backend: BackendArg,

    /// Vision model name (vision-model backend).
    #[arg(long, env = "TABLE_EXTRACT_MODEL", default_value = table_extract::config::DEFAULT_MODEL)]
    model: String,

    /// Pages to extract, 1-indexed: 5, 1-3, 1-3,5 or all.
    #[arg(long)]
    pages: Option<String>,

    /// Emit every table, separated by a blank line, instead of the first.
    #[arg(long)]
    all_tables: bool,

    /// Emit a JSON array of tables instead of CSV.
    #[arg(long)]
    json: bool,

    /// Show which backends can run and exit.
    #[arg(long)]
    list_backends: bool,

    /// Ollama endpoint (vision-model backend).
    #[arg(long, env = "OLLAMA_HOST")]
    ollama_url: Option<String>,

    /// Tesseract language (cv-ocr backend).
    #[arg(long, env = "TABLE_EXTRACT_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Rendering DPI for PDF pages (72–600).
    #[arg(long, env = "TABLE_EXTRACT_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// docling executable.
    #[arg(long, env = "TABLE_EXTRACT_DOCLING", default_value = "docling", hide = true)]
    docling_bin: PathBuf,

    /// tesseract executable.
    #[arg(long, env = "TABLE_EXTRACT_TESSERACT", default_value = "tesseract", hide = true)]
    tesseract_bin: PathBuf,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    #[value(name = "document-pipeline", alias = "docling")]
    DocumentPipeline,
    #[value(name = "vision-model", alias = "ollama")]
    VisionModel,
    #[value(name = "cv-ocr", alias = "img2table")]
    CvOcr,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::DocumentPipeline => BackendKind::DocumentPipeline,
            BackendArg::VisionModel => BackendKind::VisionModel,
            BackendArg::CvOcr => BackendKind::CvOcr,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list_backends {
        return list_backends(&build_config(&cli, None)?).await;
    }

    let Some(input) = cli.input.as_deref() else {
        anyhow::bail!("an input file is required");
    };
    if !input.exists() {
        anyhow::bail!("file not found: {}", input.display());
    }
    let pages = match cli.pages.as_deref() {
        Some(spec) => parse_page_spec(spec).context("Invalid --pages")?,
        None => None,
    };

    // ── Run extraction ───────────────────────────────────────────────────
    if !cli.quiet {
        eprintln!("Extracting tables from {}...", input.display());
    }
    let start = Instant::now();
    let tables = extract(&cli, input, pages.as_ref(), progress_for(&cli)).await?;
    let elapsed = start.elapsed().as_secs_f64();

    if tables.is_empty() {
        if !cli.quiet {
            eprintln!("No tables found ({elapsed:.1}s).");
        }
        return Ok(());
    }
    if !cli.quiet {
        eprintln!("Found {} table(s) in {elapsed:.1}s.", tables.len());
    }

    // ── Write output ─────────────────────────────────────────────────────
    match cli.output {
        Some(ref path) => {
            write_file(&tables, path, cli.all_tables, cli.json)?;
            if !cli.quiet {
                let count = if cli.all_tables { tables.len() } else { 1 };
                eprintln!(
                    "{} Wrote {} table(s) to {}",
                    green("✔"),
                    count,
                    bold(&path.display().to_string())
                );
            }
        }
        None => {
            let payload = if cli.json {
                let mut json = tables_to_json(&tables, cli.all_tables)
                    .context("Failed to serialise tables")?;
                json.push('\n');
                json
            } else {
                tables_to_csv(&tables, cli.all_tables)?
            };
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(payload.as_bytes())
                .context("Failed to write to stdout")?;
            handle.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Spinner for an extraction run, unless `--quiet` or `--no-progress`.
fn progress_for(cli: &Cli) -> Option<Arc<CliProgressCallback>> {
    (!cli.quiet && !cli.no_progress).then(CliProgressCallback::new)
}

/// Run the selected backend. The spinner is cleared whether or not the
/// run succeeds.
async fn extract(
    cli: &Cli,
    input: &Path,
    pages: Option<&PageSet>,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<Vec<Table>> {
    let result: Result<Vec<Table>> = async {
        let config = build_config(cli, progress.clone())?;
        let backend = BackendKind::from(cli.backend);
        Ok(extract_tables(input, backend.name(), pages, &config).await?)
    }
    .await;
    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }
    result
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<Arc<CliProgressCallback>>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(cli.model.clone())
        .dpi(cli.dpi)
        .ocr_lang(cli.ocr_lang.clone())
        .docling_bin(cli.docling_bin.clone())
        .tesseract_bin(cli.tesseract_bin.clone());

    if let Some(ref url) = cli.ollama_url {
        builder = builder.ollama_url(normalise_ollama_host(url));
    }
    if let Some(progress) = progress {
        builder = builder.progress(progress as Arc<dyn ExtractionProgressCallback>);
    }

    builder.build().context("Invalid configuration")
}

/// `OLLAMA_HOST` is often given as a bare `host:port`.
fn normalise_ollama_host(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

fn write_file(tables: &[Table], path: &Path, all_tables: bool, json: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut sink = BufWriter::new(file);
    if json {
        let json = tables_to_json(tables, all_tables).context("Failed to serialise tables")?;
        sink.write_all(json.as_bytes())?;
        sink.write_all(b"\n")?;
    } else {
        write_csv(tables, &mut sink, all_tables)?;
    }
    sink.flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn list_backends(config: &ExtractionConfig) -> Result<()> {
    let mut out = String::from("Available backends:\n\n");
    for kind in BackendKind::ALL {
        let installed = kind.is_available(config).await;
        let (marker, status, hint) = if installed {
            ("+", "installed", String::new())
        } else {
            ("-", "not installed", format!("  ({})", kind.install_hint()))
        };
        out.push_str(&format!("  [{marker}] {:<18} {status}{hint}\n", kind.name()));
    }
    io::stdout()
        .write_all(out.as_bytes())
        .context("Failed to write to stdout")
}
