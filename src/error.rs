//! Error types for the data-sweeper library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SweepError`] — **Fatal**: the batch cannot run at all (input path
//!   missing, options invalid, output directory not writable). Returned as
//!   `Err(SweepError)` from the top-level entry points.
//!
//! * [`FileError`] — **Non-fatal**: one uploaded file failed in one pipeline
//!   stage. It is recorded in that file's [`crate::output::FileOutcome`] and
//!   the batch moves on to the next file.
//!
//! `FileError` keeps the stage as its variant so callers can tell a parse
//! failure from a chart failure; the status line only shows the message.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the data-sweeper library.
#[derive(Debug, Error)]
pub enum SweepError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other read failure on an input path.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
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

/// A non-fatal error for a single uploaded file.
///
/// The `Display` text is what ends up in the status line, so it reads as a
/// plain sentence without the file name (the status line adds that).
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum FileError {
    /// Bytes are not valid for the declared format (CSV, Excel, DOCX).
    #[error("{detail}")]
    Parse { file: String, detail: String },

    /// The chart could not be built or drawn.
    #[error("{detail}")]
    Render { file: String, detail: String },

    /// The table or document could not be written to the target format.
    #[error("{detail}")]
    Serialize { file: String, detail: String },

    /// The byte stream is not a readable PDF container.
    #[error("{detail}")]
    Extraction { file: String, detail: String },

    /// The image bytes could not be decoded.
    #[error("{detail}")]
    Decode { file: String, detail: String },

    /// A stage panicked while handling this file.
    #[error("{detail}")]
    Internal { file: String, detail: String },
}

impl FileError {
    /// Name of the file this error belongs to.
    pub fn file(&self) -> &str {
        match self {
            FileError::Parse { file, .. }
            | FileError::Render { file, .. }
            | FileError::Serialize { file, .. }
            | FileError::Extraction { file, .. }
            | FileError::Decode { file, .. }
            | FileError::Internal { file, .. } => file,
        }
    }

    /// Short stage label, handy for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            FileError::Parse { .. } => "parse",
            FileError::Render { .. } => "render",
            FileError::Serialize { .. } => "serialize",
            FileError::Extraction { .. } => "extraction",
            FileError::Decode { .. } => "decode",
            FileError::Internal { .. } => "internal",
        }
    }
}
