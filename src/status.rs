//! Status reporting: one line per processed file plus an aggregate banner.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Banner shown once when every file in the batch succeeded.
pub const SUCCESS_BANNER: &str = "🎉 All files processed successfully!";

/// Outcome line for one file. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatus {
    pub file_name: String,
    pub success: bool,
    /// Error text for failures; the fixed confirmation otherwise.
    pub message: String,
}

impl ProcessingStatus {
    pub fn success(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            success: true,
            message: "processed successfully!".to_string(),
        }
    }

    pub fn failure(file_name: impl Into<String>, error: &FileError) -> Self {
        Self {
            file_name: file_name.into(),
            success: false,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "✅ {} processed successfully!", self.file_name)
        } else {
            write!(f, "❌ Error processing {}: {}", self.file_name, self.message)
        }
    }
}

/// Ordered list of statuses for a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReport {
    statuses: Vec<ProcessingStatus>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one file. Call exactly once per file, in intake order.
    pub fn record(&mut self, status: ProcessingStatus) {
        self.statuses.push(status);
    }

    pub fn statuses(&self) -> &[ProcessingStatus] {
        &self.statuses
    }

    /// Rendered status lines, in intake order.
    pub fn lines(&self) -> Vec<String> {
        self.statuses.iter().map(ToString::to_string).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.statuses.iter().all(|s| s.success)
    }

    /// The aggregate banner, only when nothing failed. There is no
    /// partial-success banner.
    pub fn banner(&self) -> Option<&'static str> {
        self.all_succeeded().then_some(SUCCESS_BANNER)
    }
}

impl<'a> FromIterator<&'a ProcessingStatus> for StatusReport {
    fn from_iter<I: IntoIterator<Item = &'a ProcessingStatus>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error(file: &str) -> FileError {
        FileError::Parse {
            file: file.into(),
            detail: "No columns to parse from file".into(),
        }
    }

    #[test]
    fn success_line() {
        let s = ProcessingStatus::success("a.csv");
        assert_eq!(s.to_string(), "✅ a.csv processed successfully!");
    }

    #[test]
    fn failure_line_carries_message() {
        let s = ProcessingStatus::failure("b.csv", &parse_error("b.csv"));
        assert_eq!(
            s.to_string(),
            "❌ Error processing b.csv: No columns to parse from file"
        );
    }

    #[test]
    fn one_failure_suppresses_banner() {
        let mut report = StatusReport::new();
        report.record(ProcessingStatus::success("a.csv"));
        report.record(ProcessingStatus::failure("b.csv", &parse_error("b.csv")));
        report.record(ProcessingStatus::success("c.png"));

        let lines = report.lines();
        assert_eq!(lines.iter().filter(|l| l.starts_with("✅")).count(), 2);
        assert_eq!(lines.iter().filter(|l| l.starts_with("❌")).count(), 1);
        assert_eq!(report.banner(), None);
    }

    #[test]
    fn all_success_emits_banner() {
        let mut report = StatusReport::new();
        report.record(ProcessingStatus::success("a.csv"));
        assert_eq!(report.banner(), Some(SUCCESS_BANNER));
    }

    #[test]
    fn empty_report_emits_banner() {
        assert_eq!(StatusReport::new().banner(), Some(SUCCESS_BANNER));
    }
}
