//! Result types produced by a processing pass.
//!
//! Everything here is transient: built once per batch, handed to the caller,
//! then dropped. All types serialise to JSON so the CLI can emit a
//! machine-readable report; byte buffers are base64-encoded in that form.

use crate::error::FileError;
use crate::pipeline::intake::FileKind;
use crate::status::ProcessingStatus;
use serde::{Deserialize, Serialize};

/// A downloadable artifact: bytes plus a MIME type and suggested file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Suggested download name, e.g. `converted_sales.csv` or `report.pdf`.
    pub file_name: String,
    pub mime_type: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

/// First rows of a parsed table, rendered as text for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row count of the whole table (after empty rows were dropped).
    pub total_rows: usize,
}

/// Everything produced for one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub kind: FileKind,
    /// Upload size in KB (bytes / 1024).
    pub size_kb: f64,
    /// Head of the table, for CSV/Excel uploads.
    pub preview: Option<TablePreview>,
    /// Confirmation from the cleaning step, when one ran.
    pub cleaning_note: Option<String>,
    /// Rendered chart as PNG bytes.
    #[serde(with = "base64_opt_bytes")]
    pub chart_png: Option<Vec<u8>>,
    /// Concatenated page text, for PDF uploads.
    pub extracted_text: Option<String>,
    /// Converted file offered for download.
    pub download: Option<ConversionResult>,
    /// Stage error, when the pipeline failed.
    pub error: Option<FileError>,
    pub status: ProcessingStatus,
}

impl FileOutcome {
    /// `true` when the file's pipeline finished without error.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Name for the saved chart image: `<stem>_chart.png`.
    pub fn chart_file_name(&self) -> String {
        let stem = std::path::Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone());
        format!("{stem}_chart.png")
    }
}

/// Timing and count statistics for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Files accepted at intake.
    pub total_files: usize,
    pub succeeded_files: usize,
    pub failed_files: usize,
    /// Files excluded at intake because of their extension.
    pub rejected_files: usize,
    pub total_bytes: u64,
    pub total_duration_ms: u64,
}

/// Outcome of a whole batch, in intake order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// Names of uploads refused at intake.
    pub rejected: Vec<String>,
    pub stats: ProcessingStats,
}

impl BatchReport {
    /// Status lines in intake order.
    pub fn statuses(&self) -> impl Iterator<Item = &ProcessingStatus> {
        self.outcomes.iter().map(|o| &o.status)
    }

    /// `true` when every processed file succeeded (vacuously true for none).
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::succeeded)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod base64_opt_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_some(&STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
