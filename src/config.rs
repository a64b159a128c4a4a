//! Per-file request parameters.
//!
//! Every knob lives in [`ProcessOptions`], passed explicitly to each pipeline
//! stage and built via [`ProcessOptionsBuilder`].

use crate::error::SweepError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Options applied to every file in a batch.
///
/// # Example
/// ```rust
/// use data_sweeper::{ChartKind, CleanOp, ProcessOptions, TabularFormat};
///
/// let options = ProcessOptions::builder()
///     .clean(CleanOp::RemoveDuplicates)
///     .chart(ChartKind::Bar)
///     .chart_y("sales")
///     .convert_to(TabularFormat::Excel)
///     .build()
///     .unwrap();
/// assert_eq!(options.preview_rows, 5);
/// ```
#[derive(Clone)]
pub struct ProcessOptions {
    /// Cleaning transform applied after parse. Default: [`CleanOp::None`].
    pub clean: CleanOp,

    /// Chart to render for tabular files. Default: no chart.
    pub chart: ChartRequest,

    /// Target format for the tabular download. Default: CSV.
    pub convert_to: TabularFormat,

    /// Convert `.docx` uploads to PDF. Default: false.
    pub convert_documents: bool,

    /// Convert `.jpg`/`.png` uploads to PDF. Default: false.
    pub convert_images: bool,

    /// Number of leading rows kept in the table preview. Range: 1–100. Default: 5.
    pub preview_rows: usize,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            clean: CleanOp::default(),
            chart: ChartRequest::default(),
            convert_to: TabularFormat::default(),
            convert_documents: false,
            convert_images: false,
            preview_rows: 5,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessOptions")
            .field("clean", &self.clean)
            .field("chart", &self.chart)
            .field("convert_to", &self.convert_to)
            .field("convert_documents", &self.convert_documents)
            .field("convert_images", &self.convert_images)
            .field("preview_rows", &self.preview_rows)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProcessingProgressCallback>"),
            )
            .finish()
    }
}

impl ProcessOptions {
    /// Create a new builder for `ProcessOptions`.
    pub fn builder() -> ProcessOptionsBuilder {
        ProcessOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ProcessOptions`].
#[derive(Debug)]
pub struct ProcessOptionsBuilder {
    options: ProcessOptions,
}

impl ProcessOptionsBuilder {
    pub fn clean(mut self, op: CleanOp) -> Self {
        self.options.clean = op;
        self
    }

    pub fn chart(mut self, kind: ChartKind) -> Self {
        self.options.chart.kind = kind;
        self
    }

    pub fn chart_x(mut self, column: impl Into<String>) -> Self {
        self.options.chart.x = Some(column.into());
        self
    }

    pub fn chart_y(mut self, column: impl Into<String>) -> Self {
        self.options.chart.y = Some(column.into());
        self
    }

    pub fn convert_to(mut self, format: TabularFormat) -> Self {
        self.options.convert_to = format;
        self
    }

    pub fn convert_documents(mut self, v: bool) -> Self {
        self.options.convert_documents = v;
        self
    }

    pub fn convert_images(mut self, v: bool) -> Self {
        self.options.convert_images = v;
        self
    }

    pub fn preview_rows(mut self, n: usize) -> Self {
        self.options.preview_rows = n.clamp(1, 100);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating constraints.
    pub fn build(self) -> Result<ProcessOptions, SweepError> {
        let chart = &self.options.chart;
        if chart.x.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(SweepError::InvalidConfig("x axis name is empty".into()));
        }
        if chart.y.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(SweepError::InvalidConfig("y axis name is empty".into()));
        }
        Ok(self.options)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Cleaning transform applied once to a parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CleanOp {
    /// Leave the table as parsed. (default)
    #[default]
    None,
    /// Drop rows that repeat an earlier row exactly, keeping the first.
    RemoveDuplicates,
    /// Replace each missing cell with the nearest value above it.
    FillMissingForward,
}

impl CleanOp {
    /// Confirmation shown after the transform ran, if any.
    pub fn confirmation(&self) -> Option<&'static str> {
        match self {
            CleanOp::None => None,
            CleanOp::RemoveDuplicates => Some("✅ Duplicates Removed!"),
            CleanOp::FillMissingForward => Some("✅ Missing Values Filled!"),
        }
    }
}

/// Kind of chart drawn for a tabular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartKind {
    /// No chart. (default)
    #[default]
    None,
    Bar,
    Line,
    /// Percentage shares of the y column's value counts.
    Pie,
    Scatter,
}

/// A chart selection: kind plus axis columns.
///
/// Omitted axes fall back to the first column (x) and the first numeric
/// column (y), which is what the selection form pre-selects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Option<String>,
}

/// Target format for the tabular download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TabularFormat {
    /// Comma-separated values. (default)
    #[default]
    Csv,
    /// Office Open XML workbook.
    Excel,
}

impl TabularFormat {
    /// MIME type of the serialised download.
    pub fn mime_type(&self) -> &'static str {
        match self {
            TabularFormat::Csv => "text/csv",
            TabularFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}
