//! CLI binary for pageturn.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ViewerConfig`, runs the ingestion pipeline, and writes the rendered
//! page bitmaps to a directory.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pageturn::{IngestPipeline, PageImageFormat, ViewerConfig};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render every page of a document to ./pages/
  pageturn book.pdf

  # Custom output directory and oversampling scale
  pageturn book.pdf --out-dir renders/ --scale 2.0

  # JPEG pages (smaller, slightly softer text)
  pageturn book.pdf --format jpeg --quality 85

  # Render from a URL
  pageturn https://arxiv.org/pdf/1706.03762 --out-dir attention/

  # Page count and native dimensions only, no files written
  pageturn --inspect-only book.pdf

  # Machine-readable summary
  pageturn --json book.pdf > summary.json

ENVIRONMENT VARIABLES:
  PAGETURN_OUT_DIR         Default output directory
  PAGETURN_SCALE           Default oversampling scale
  PDFIUM_DYNAMIC_LIB_PATH  Directory containing libpdfium

SETUP:
  pageturn renders pages through pdfium. Install the pdfium shared library
  (e.g. from bblanchon/pdfium-binaries) and point PDFIUM_DYNAMIC_LIB_PATH
  at it if it is not on the default library search path.
"#;

/// Render a PDF's pages to bitmaps, the way the flipbook viewer would.
#[derive(Parser, Debug)]
#[command(
    name = "pageturn",
    version,
    about = "Render PDF pages to flipbook-ready bitmaps",
    long_about = "Ingest a PDF document (local file or URL) exactly as the flipbook viewer \
core does — sequential page rendering, whole-document failure policy, live progress — and \
write the resulting page bitmaps to a directory.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write page bitmaps into.
    #[arg(short, long, env = "PAGETURN_OUT_DIR", default_value = "pages")]
    out_dir: PathBuf,

    /// Oversampling scale for rasterisation (0.5–8.0).
    #[arg(long, env = "PAGETURN_SCALE", default_value_t = 2.5)]
    scale: f32,

    /// Bitmap format: png or jpeg.
    #[arg(long, env = "PAGETURN_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// JPEG quality (1–100); ignored for png.
    #[arg(long, env = "PAGETURN_QUALITY", default_value_t = 85)]
    quality: u8,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAGETURN_PASSWORD")]
    password: Option<String>,

    /// Document size ceiling in megabytes.
    #[arg(long, env = "PAGETURN_MAX_SIZE_MB", default_value_t = 50)]
    max_size_mb: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PAGETURN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print page count and native dimensions only; write no files.
    #[arg(long)]
    inspect_only: bool,

    /// Output a structured JSON summary instead of human-readable text.
    #[arg(long, env = "PAGETURN_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PAGETURN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGETURN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGETURN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpeg,
}

#[derive(Serialize)]
struct Summary {
    input: String,
    pages: usize,
    mean_aspect_ratio: Option<f32>,
    duration_ms: u64,
    out_dir: Option<PathBuf>,
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active; the
    // bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let pipeline = IngestPipeline::with_pdfium(config);

    // ── Run ingestion with a live progress bar ───────────────────────────
    let bar = if show_progress {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let started = Instant::now();

    // Drain live progress snapshots into the bar while ingestion runs.
    let progress_task = bar.as_ref().map(|bar| {
        let bar = bar.clone();
        let mut snapshots = pipeline.progress_stream();
        tokio::spawn(async move {
            while let Some(snapshot) = snapshots.next().await {
                bar.set_position(snapshot.percent as u64);
            }
        })
    });

    let result = pipeline.ingest_from(&cli.input).await;

    if let Some(task) = progress_task {
        task.abort();
    }
    if let Some(ref bar) = bar {
        bar.finish_and_clear();
    }

    let pages = result.context("Ingestion failed")?;
    let duration_ms = started.elapsed().as_millis() as u64;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        if cli.json {
            let summary = Summary {
                input: cli.input.clone(),
                pages: pages.len(),
                mean_aspect_ratio: pages.mean_aspect_ratio(),
                duration_ms,
                out_dir: None,
                files: Vec::new(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("Input:         {}", cli.input);
            println!("Pages:         {}", pages.len());
            if let Some(ratio) = pages.mean_aspect_ratio() {
                println!("Aspect ratio:  {ratio:.3}");
            }
            for page in pages.iter() {
                println!(
                    "  page {:>3}  {:>6.0} × {:>6.0} px",
                    page.index, page.width, page.height
                );
            }
        }
        return Ok(());
    }

    // ── Write bitmaps ────────────────────────────────────────────────────
    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", cli.out_dir.display()))?;

    let extension = match cli.format {
        FormatArg::Png => "png",
        FormatArg::Jpeg => "jpg",
    };
    let mut files = Vec::with_capacity(pages.len());
    for page in pages.iter() {
        let path = cli.out_dir.join(format!("page-{:03}.{extension}", page.index));
        tokio::fs::write(&path, &page.image)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        files.push(path);
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let summary = Summary {
            input: cli.input.clone(),
            pages: pages.len(),
            mean_aspect_ratio: pages.mean_aspect_ratio(),
            duration_ms,
            out_dir: Some(cli.out_dir.clone()),
            files,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            if pages.is_empty() { red("✘") } else { green("✔") },
            bold(&pages.len().to_string()),
            duration_ms,
            bold(&cli.out_dir.display().to_string()),
        );
        eprintln!(
            "   {}",
            dim(&format!(
                "{} × {:.1} oversampling, {} format",
                pages.len(),
                cli.scale,
                extension
            )),
        );
    }

    Ok(())
}

/// Map CLI args to `ViewerConfig`.
fn build_config(cli: &Cli) -> Result<ViewerConfig> {
    let format = match cli.format {
        FormatArg::Png => PageImageFormat::Png,
        FormatArg::Jpeg => PageImageFormat::Jpeg { quality: cli.quality },
    };

    let mut builder = ViewerConfig::builder()
        .render_scale(cli.scale)
        .page_image_format(format)
        .max_document_bytes(cli.max_size_mb * 1024 * 1024)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }

    builder.build().context("Invalid configuration")
}
