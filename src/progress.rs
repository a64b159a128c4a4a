//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn ProcessingProgressCallback>`] via
//! [`crate::config::ProcessOptionsBuilder::progress_callback`] to receive
//! events as the batch walks its files. Files are processed one at a time in
//! intake order, so events arrive in that order too.
//!
//! # Example
//!
//! ```rust
//! use data_sweeper::{ProcessingProgressCallback, ProcessOptions};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: AtomicUsize,
//! }
//!
//! impl ProcessingProgressCallback for CountingCallback {
//!     fn on_file_error(&self, _idx: usize, _total: usize, name: &str, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{name}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { failed: AtomicUsize::new(0) });
//!
//! let options = ProcessOptions::builder()
//!     .progress_callback(counter as Arc<dyn ProcessingProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `idx` is 1-based.
pub trait ProcessingProgressCallback: Send + Sync {
    /// Called once before the first file, with the number of accepted files.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file enters its pipeline.
    fn on_file_start(&self, idx: usize, total_files: usize, name: &str) {
        let _ = (idx, total_files, name);
    }

    /// Called when a file's pipeline finished without error.
    fn on_file_complete(&self, idx: usize, total_files: usize, name: &str) {
        let _ = (idx, total_files, name);
    }

    /// Called when a file's pipeline failed.
    fn on_file_error(&self, idx: usize, total_files: usize, name: &str, error: &str) {
        let _ = (idx, total_files, name, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ProcessOptions`].
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;
