//! CLI binary for data-sweeper.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ProcessOptions`, writes downloads to disk and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use data_sweeper::{
    process_paths, write_artifact, write_bytes, BatchReport, ChartKind, CleanOp, FileOutcome,
    ProcessOptions, ProcessingProgressCallback, ProgressCallback, StatusReport, TablePreview,
    TabularFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Sweeping");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ProcessingProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.reset_eta();
    }

    fn on_file_start(&self, _idx: usize, _total: usize, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, idx: usize, total: usize, name: &str) {
        self.bar
            .println(format!("  {} {:>3}/{:<3}  {}", green("✓"), idx, total, name));
        self.bar.inc(1);
    }

    fn on_file_error(&self, idx: usize, total: usize, name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            idx,
            total,
            name,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files processed",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files processed  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Preview a CSV and save it back as CSV
  sweep sales.csv

  # Remove duplicates and save as Excel
  sweep --clean duplicates --to excel sales.csv -o out/

  # Forward-fill gaps and draw a bar chart of revenue by region
  sweep --clean fill-forward --chart bar --x region --y revenue sales.xlsx

  # Extract PDF text, convert Word and images to PDF
  sweep report.pdf letter.docx photo.png --docx-to-pdf --image-to-pdf

  # Machine-readable report
  sweep --json *.csv > report.json

SUPPORTED FILES:
  .csv .xlsx    preview, clean, chart, convert (CSV ↔ Excel)
  .pdf          text extraction
  .docx         convert to PDF (with --docx-to-pdf)
  .jpg .png     convert to PDF (with --image-to-pdf)

  Other extensions are skipped and get no status line.

OUTPUT FILES (in --out-dir):
  converted_<name>      cleaned table in the --to format
  <stem>_chart.png      chart, when --chart is not none
  <stem>.pdf            converted Word document or image
"#;

/// Clean, chart and convert data files.
#[derive(Parser, Debug)]
#[command(
    name = "sweep",
    version,
    about = "Clean, chart and convert CSV/Excel files; extract PDF text; convert Word and images to PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to process.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Cleaning applied to tables after empty rows are dropped.
    #[arg(long, env = "SWEEP_CLEAN", value_enum, default_value = "none")]
    clean: CleanArg,

    /// Chart to draw for each table.
    #[arg(long, env = "SWEEP_CHART", value_enum, default_value = "none")]
    chart: ChartArg,

    /// Chart x-axis column. Default: first column.
    #[arg(long, env = "SWEEP_X")]
    x: Option<String>,

    /// Chart y-axis column. Default: first numeric column.
    #[arg(long, env = "SWEEP_Y")]
    y: Option<String>,

    /// Format of the converted table.
    #[arg(long, env = "SWEEP_TO", value_enum, default_value = "csv")]
    to: FormatArg,

    /// Convert .docx files to PDF.
    #[arg(long, env = "SWEEP_DOCX_TO_PDF")]
    docx_to_pdf: bool,

    /// Convert .jpg/.png files to PDF.
    #[arg(long, env = "SWEEP_IMAGE_TO_PDF")]
    image_to_pdf: bool,

    /// Directory for converted files and charts.
    #[arg(short, long, env = "SWEEP_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Rows shown in each table preview (1–100).
    #[arg(long, env = "SWEEP_PREVIEW", default_value_t = 5,
          value_parser = clap::value_parser!(u16).range(1..=100))]
    preview: u16,

    /// Output the structured report as JSON.
    #[arg(long, env = "SWEEP_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SWEEP_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SWEEP_VERBOSE")]
    verbose: bool,

    /// Only print status lines and errors.
    #[arg(short, long, env = "SWEEP_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CleanArg {
    None,
    Duplicates,
    FillForward,
}

impl From<CleanArg> for CleanOp {
    fn from(v: CleanArg) -> Self {
        match v {
            CleanArg::None => CleanOp::None,
            CleanArg::Duplicates => CleanOp::RemoveDuplicates,
            CleanArg::FillForward => CleanOp::FillMissingForward,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ChartArg {
    None,
    Bar,
    Line,
    Pie,
    Scatter,
}

impl From<ChartArg> for ChartKind {
    fn from(v: ChartArg) -> Self {
        match v {
            ChartArg::None => ChartKind::None,
            ChartArg::Bar => ChartKind::Bar,
            ChartArg::Line => ChartKind::Line,
            ChartArg::Pie => ChartKind::Pie,
            ChartArg::Scatter => ChartKind::Scatter,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Csv,
    Excel,
}

impl From<FormatArg> for TabularFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Csv => TabularFormat::Csv,
            FormatArg::Excel => TabularFormat::Excel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
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

    // ── Build options ────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn ProcessingProgressCallback>)
    } else {
        None
    };
    let options = build_options(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = process_paths(&cli.files, &options)
        .await
        .context("Processing failed")?;

    if !cli.quiet && !cli.json {
        for name in &report.rejected {
            eprintln!("{} {} skipped: unsupported file type", cyan("⚠"), name);
        }
    }

    // ── Write downloads and charts ───────────────────────────────────────
    for outcome in &report.outcomes {
        let saved = save_outputs(&cli, outcome).await?;
        if !cli.quiet && !cli.json {
            print_outcome(outcome, &saved);
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    print_statuses(&report);

    if !cli.quiet && !show_progress {
        eprintln!(
            "Processed {}/{} files in {}ms",
            report.stats.succeeded_files, report.stats.total_files, report.stats.total_duration_ms
        );
    }

    Ok(())
}

/// Map CLI args to `ProcessOptions`.
fn build_options(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ProcessOptions> {
    let mut builder = ProcessOptions::builder()
        .clean(cli.clean.into())
        .chart(cli.chart.into())
        .convert_to(cli.to.into())
        .convert_documents(cli.docx_to_pdf)
        .convert_images(cli.image_to_pdf)
        .preview_rows(usize::from(cli.preview));

    if let Some(ref x) = cli.x {
        builder = builder.chart_x(x);
    }
    if let Some(ref y) = cli.y {
        builder = builder.chart_y(y);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write the outcome's download and chart into `--out-dir`.
async fn save_outputs(cli: &Cli, outcome: &FileOutcome) -> Result<Vec<PathBuf>> {
    let mut saved = Vec::new();
    if let Some(ref png) = outcome.chart_png {
        let path = write_bytes(&cli.out_dir, &outcome.chart_file_name(), png)
            .await
            .context("Failed to save chart")?;
        saved.push(path);
    }
    if let Some(ref download) = outcome.download {
        let path = write_artifact(&cli.out_dir, download)
            .await
            .context("Failed to save converted file")?;
        saved.push(path);
    }
    Ok(saved)
}

fn print_outcome(outcome: &FileOutcome, saved: &[PathBuf]) {
    println!();
    println!(
        "{}  {}",
        bold(&outcome.file_name),
        dim(&format!("{:.2} KB", outcome.size_kb))
    );

    if let Some(ref preview) = outcome.preview {
        print_preview(preview);
    }
    if let Some(ref note) = outcome.cleaning_note {
        println!("{note}");
    }
    if let Some(ref text) = outcome.extracted_text {
        println!("{}", cyan("📝 Extracted text"));
        if text.is_empty() {
            println!("{}", dim("(no text found)"));
        } else {
            println!("{}", text.trim_end());
        }
    }
    for path in saved {
        println!("⬇️  {}", path.display());
    }
}

/// Print a preview as a left-aligned grid.
fn print_preview(preview: &TablePreview) {
    let mut widths: Vec<usize> = preview.columns.iter().map(|c| c.chars().count()).collect();
    for row in &preview.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", bold(&line(&preview.columns)));
    for row in &preview.rows {
        println!("{}", line(row));
    }
    if preview.total_rows > preview.rows.len() {
        println!(
            "{}",
            dim(&format!("… {} rows in total", preview.total_rows))
        );
    }
}

fn print_statuses(report: &BatchReport) {
    let statuses: StatusReport = report.statuses().collect();
    println!();
    for status in statuses.statuses() {
        let line = status.to_string();
        if status.success {
            println!("{}", green(&line));
        } else {
            println!("{}", red(&line));
        }
    }
    if let Some(banner) = statuses.banner() {
        println!("{}", bold(banner));
    }
}
