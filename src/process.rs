//! Eager (whole-batch) processing entry points.
//!
//! [`process_batch`] walks the accepted uploads one at a time, in intake
//! order, and returns only after every file has been attempted. Use
//! [`crate::stream::process_stream`] to receive outcomes as each file
//! finishes.
//!
//! A failing file never stops the batch: its [`FileError`] is recorded in
//! its [`FileOutcome`] and the next file starts. `Err(SweepError)` is kept
//! for conditions that stop the whole batch.

use crate::config::{ProcessOptions, TabularFormat};
use crate::error::{FileError, SweepError};
use crate::output::{BatchReport, ConversionResult, FileOutcome, ProcessingStats};
use crate::pipeline::intake::{self, FileKind, UploadedFile};
use crate::pipeline::{chart, document, image_pdf, pdf_text, tabular};
use crate::status::ProcessingStatus;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Process a batch of uploads.
///
/// Uploads with an unsupported extension are refused at intake and listed
/// in [`BatchReport::rejected`]; they get no outcome and no status line.
///
/// # Errors
/// Returns `Err(SweepError::Internal)` only if a worker task was cancelled.
///
/// # Example
/// ```rust,no_run
/// use data_sweeper::{process_batch, ProcessOptions, UploadedFile};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![UploadedFile::new("sales.csv", std::fs::read("sales.csv")?)];
/// let report = process_batch(files, &ProcessOptions::default()).await?;
/// for status in report.statuses() {
///     println!("{status}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn process_batch(
    files: Vec<UploadedFile>,
    options: &ProcessOptions,
) -> Result<BatchReport, SweepError> {
    let total_start = Instant::now();

    // ── Step 1: Intake ───────────────────────────────────────────────────
    let intake = intake::accept(files);
    let total = intake.accepted.len();
    info!(
        "Processing {} files ({} refused at intake)",
        total,
        intake.rejected.len()
    );

    if let Some(ref cb) = options.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 2: One file at a time, in intake order ──────────────────────
    let mut outcomes = Vec::with_capacity(total);
    let mut total_bytes = 0u64;
    for (i, (kind, file)) in intake.accepted.into_iter().enumerate() {
        total_bytes += file.size() as u64;
        outcomes.push(process_indexed(i + 1, total, kind, file, options).await?);
    }

    // ── Step 3: Stats ────────────────────────────────────────────────────
    let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
    let stats = ProcessingStats {
        total_files: total,
        succeeded_files: succeeded,
        failed_files: total - succeeded,
        rejected_files: intake.rejected.len(),
        total_bytes,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} files succeeded, {}ms total",
        succeeded, total, stats.total_duration_ms
    );

    if let Some(ref cb) = options.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    Ok(BatchReport {
        outcomes,
        rejected: intake.rejected,
        stats,
    })
}

/// Synchronous wrapper around [`process_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_batch_sync(
    files: Vec<UploadedFile>,
    options: &ProcessOptions,
) -> Result<BatchReport, SweepError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SweepError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_batch(files, options))
}

/// Load local files and process them as one batch.
///
/// Any unreadable path is fatal and stops before processing begins.
pub async fn process_paths<P: AsRef<Path>>(
    paths: &[P],
    options: &ProcessOptions,
) -> Result<BatchReport, SweepError> {
    let files = paths
        .iter()
        .map(intake::read_upload)
        .collect::<Result<Vec<_>, _>>()?;
    process_batch(files, options).await
}

/// Run one classified upload through its pipeline.
///
/// A panic inside the pipeline is reported as [`FileError::Internal`] on
/// this file's outcome. Does not fire progress callbacks;
/// [`process_batch`] and [`crate::stream::process_stream`] do that around
/// each call.
pub async fn process_file(
    kind: FileKind,
    file: UploadedFile,
    options: &ProcessOptions,
) -> Result<FileOutcome, SweepError> {
    run_stage(kind, file, options, run_pipeline).await
}

type Stage = fn(FileKind, &UploadedFile, &ProcessOptions, &mut Produced) -> Result<(), FileError>;

async fn run_stage(
    kind: FileKind,
    file: UploadedFile,
    options: &ProcessOptions,
    stage: Stage,
) -> Result<FileOutcome, SweepError> {
    let start = Instant::now();
    let name = file.name.clone();
    let size_kb = file.size_kb();
    let opts = options.clone();

    // Parsing, drawing and encoding are CPU-bound.
    let joined = tokio::task::spawn_blocking(move || {
        let mut produced = Produced::default();
        let result = stage(kind, &file, &opts, &mut produced);
        (produced, result.err())
    })
    .await;

    let (produced, error) = match joined {
        Ok(done) => done,
        Err(e) if e.is_panic() => {
            let detail = format!("Unexpected failure: {}", panic_message(e.into_panic()));
            let error = FileError::Internal {
                file: name.clone(),
                detail,
            };
            (Produced::default(), Some(error))
        }
        Err(e) => {
            return Err(SweepError::Internal(format!(
                "Worker for '{}' failed: {}",
                name, e
            )))
        }
    };

    let status = match &error {
        None => {
            info!("{} processed in {}ms", name, start.elapsed().as_millis());
            ProcessingStatus::success(&name)
        }
        Some(e) => {
            warn!("{} failed at {} stage: {}", name, e.stage(), e);
            ProcessingStatus::failure(&name, e)
        }
    };

    Ok(FileOutcome {
        file_name: name,
        kind,
        size_kb,
        preview: produced.preview,
        cleaning_note: produced.cleaning_note,
        chart_png: produced.chart_png,
        extracted_text: produced.extracted_text,
        download: produced.download,
        error,
        status,
    })
}

/// [`process_file`] wrapped in the per-file progress events.
pub(crate) async fn process_indexed(
    idx: usize,
    total: usize,
    kind: FileKind,
    file: UploadedFile,
    options: &ProcessOptions,
) -> Result<FileOutcome, SweepError> {
    let name = file.name.clone();
    if let Some(ref cb) = options.progress_callback {
        cb.on_file_start(idx, total, &name);
    }

    let outcome = process_file(kind, file, options).await?;

    if let Some(ref cb) = options.progress_callback {
        match &outcome.error {
            None => cb.on_file_complete(idx, total, &name),
            Some(e) => cb.on_file_error(idx, total, &name, &e.to_string()),
        }
    }
    Ok(outcome)
}

/// Write a download into `dir` under its suggested name.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
/// Returns the final path.
pub async fn write_artifact(
    dir: impl AsRef<Path>,
    artifact: &ConversionResult,
) -> Result<PathBuf, SweepError> {
    write_bytes(dir.as_ref(), &artifact.file_name, &artifact.bytes).await
}

/// Write raw bytes into `dir` as `file_name`, atomically.
///
/// Only the final component of `file_name` is used.
pub async fn write_bytes(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, SweepError> {
    let leaf = Path::new(file_name)
        .file_name()
        .ok_or_else(|| SweepError::Internal(format!("Invalid output name '{}'", file_name)))?;
    let path = dir.join(leaf);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SweepError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let tmp_path = dir.join(format!(".{}.tmp", leaf.to_string_lossy()));
    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| SweepError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| SweepError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "worker panicked".to_string(), |s| s.to_string()),
    }
}

/// What a pipeline produced before it finished or stopped.
#[derive(Default)]
struct Produced {
    preview: Option<crate::output::TablePreview>,
    cleaning_note: Option<String>,
    chart_png: Option<Vec<u8>>,
    extracted_text: Option<String>,
    download: Option<ConversionResult>,
}

/// Dispatch to the handler for `kind`. Outputs land in `out` as they are
/// produced, so a late failure still leaves the earlier ones.
fn run_pipeline(
    kind: FileKind,
    file: &UploadedFile,
    options: &ProcessOptions,
    out: &mut Produced,
) -> Result<(), FileError> {
    let name = file.name.as_str();
    match kind {
        FileKind::Csv | FileKind::Excel => {
            let format = if kind == FileKind::Csv {
                TabularFormat::Csv
            } else {
                TabularFormat::Excel
            };
            let mut table = tabular::parse(format, name, &file.bytes)?;

            let dropped = table.drop_empty_rows();
            debug!("{}: dropped {} empty rows", name, dropped);
            out.preview = Some(table.preview(options.preview_rows));

            let changed = table.clean(options.clean);
            if let Some(note) = options.clean.confirmation() {
                debug!("{}: {:?} changed {} rows/cells", name, options.clean, changed);
                out.cleaning_note = Some(note.to_string());
            }

            if let Some(data) = chart::prepare(&table, &options.chart, name)? {
                out.chart_png = Some(chart::render(&data, name)?);
            }

            out.download = Some(tabular::serialize(&table, options.convert_to, name)?);
        }
        FileKind::Pdf => {
            out.extracted_text = Some(pdf_text::extract_text(name, &file.bytes)?);
        }
        FileKind::Word => {
            if options.convert_documents {
                out.download = Some(document::convert(name, &file.bytes)?);
            }
        }
        FileKind::Image => {
            if options.convert_images {
                out.download = Some(image_pdf::convert(name, &file.bytes)?);
            } else {
                let img = image_pdf::decode(name, &file.bytes)?;
                debug!("{}: {}x{} image", name, img.width(), img.height());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartKind, CleanOp};

    fn run(kind: FileKind, name: &str, bytes: &[u8], options: &ProcessOptions) -> (Produced, Result<(), FileError>) {
        let mut out = Produced::default();
        let result = run_pipeline(kind, &UploadedFile::new(name, bytes), options, &mut out);
        (out, result)
    }

    #[test]
    fn tabular_pipeline_fills_every_output() {
        let options = ProcessOptions::builder()
            .clean(CleanOp::FillMissingForward)
            .build()
            .unwrap();
        let (out, result) = run(FileKind::Csv, "a.csv", b"a,b,c\n1,,3\n,,\n4,5,6\n", &options);
        result.unwrap();

        let preview = out.preview.unwrap();
        assert_eq!(preview.total_rows, 2);
        assert_eq!(out.cleaning_note.as_deref(), Some("✅ Missing Values Filled!"));
        assert!(out.chart_png.is_none());
        let download = out.download.unwrap();
        assert_eq!(download.file_name, "converted_a.csv");
        assert_eq!(download.bytes, b"a,b,c\n1,,3\n4,5,6\n");
    }

    #[test]
    fn chart_failure_keeps_preview() {
        let options = ProcessOptions::builder()
            .chart(ChartKind::Bar)
            .chart_y("missing")
            .build()
            .unwrap();
        let (out, result) = run(FileKind::Csv, "a.csv", b"a,b\n1,2\n", &options);
        let err = result.unwrap_err();
        assert!(matches!(err, FileError::Render { .. }));
        assert!(out.preview.is_some());
        assert!(out.download.is_none());
    }

    #[test]
    fn word_without_flag_does_nothing() {
        let (out, result) = run(FileKind::Word, "w.docx", b"not read", &ProcessOptions::default());
        result.unwrap();
        assert!(out.download.is_none());
    }

    #[test]
    fn image_without_flag_still_decodes() {
        let (_, result) = run(FileKind::Image, "x.png", b"garbage", &ProcessOptions::default());
        assert!(matches!(result, Err(FileError::Decode { .. })));
    }

    fn exploding_stage(
        _: FileKind,
        _: &UploadedFile,
        _: &ProcessOptions,
        _: &mut Produced,
    ) -> Result<(), FileError> {
        panic!("index out of bounds");
    }

    #[tokio::test]
    async fn panicking_stage_fails_only_its_file() {
        let options = ProcessOptions::default();
        let outcome = run_stage(
            FileKind::Word,
            UploadedFile::new("odd.docx", b"PK"),
            &options,
            exploding_stage,
        )
        .await
        .unwrap();
        let err = outcome.error.as_ref().unwrap();
        assert!(matches!(err, FileError::Internal { .. }));
        assert_eq!(err.to_string(), "Unexpected failure: index out of bounds");
        assert_eq!(
            outcome.status.to_string(),
            "❌ Error processing odd.docx: Unexpected failure: index out of bounds"
        );

        let next = process_file(FileKind::Csv, UploadedFile::new("b.csv", "a\n1\n"), &options)
            .await
            .unwrap();
        assert!(next.succeeded());
    }

    #[tokio::test]
    async fn write_bytes_is_atomic_and_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bytes(dir.path(), "nested/out.csv", b"x\n1\n").await.unwrap();
        assert_eq!(path, dir.path().join("out.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"x\n1\n");
        assert!(!dir.path().join(".out.csv.tmp").exists());
    }

    #[tokio::test]
    async fn process_paths_missing_file_is_fatal() {
        let err = process_paths(&["/no/such/file.csv"], &ProcessOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SweepError::FileNotFound { .. }));
    }
}
