//! # data-sweeper
//!
//! Clean, chart and convert uploaded data files.
//!
//! A batch of uploads is classified by extension and each file is routed to
//! one handler. A failing file is reported and the batch moves on; every
//! accepted file gets exactly one status line.
//!
//! ## Pipeline Overview
//!
//! ```text
//! uploads
//!  │
//!  ├─ 1. Intake   classify by extension (.csv .xlsx .pdf .docx .jpg .png)
//!  ├─ 2. Tabular  parse → drop empty rows → preview → clean → chart → serialise
//!  ├─ 3. PDF      page-by-page text extraction
//!  ├─ 4. Word     paragraphs redrawn onto a PDF page (opt-in)
//!  ├─ 5. Image    decode, re-encode as a one-page PDF (opt-in)
//!  └─ 6. Status   one line per file + banner when all succeeded
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use data_sweeper::{process_batch, CleanOp, ProcessOptions, TabularFormat, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ProcessOptions::builder()
//!         .clean(CleanOp::RemoveDuplicates)
//!         .convert_to(TabularFormat::Excel)
//!         .build()?;
//!     let files = vec![UploadedFile::new("sales.csv", std::fs::read("sales.csv")?)];
//!     let report = process_batch(files, &options).await?;
//!     for status in report.statuses() {
//!         println!("{status}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sweep` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! data-sweeper = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod status;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ChartKind, ChartRequest, CleanOp, ProcessOptions, ProcessOptionsBuilder, TabularFormat,
};
pub use error::{FileError, SweepError};
pub use output::{BatchReport, ConversionResult, FileOutcome, ProcessingStats, TablePreview};
pub use pipeline::intake::{FileKind, UploadedFile};
pub use pipeline::table::{Cell, Table};
pub use process::{
    process_batch, process_batch_sync, process_file, process_paths, write_artifact, write_bytes,
};
pub use progress::{NoopProgressCallback, ProcessingProgressCallback, ProgressCallback};
pub use status::{ProcessingStatus, StatusReport, SUCCESS_BANNER};
pub use stream::{process_stream, OutcomeStream};
