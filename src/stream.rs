//! Streaming API: emit one outcome per file as it completes.
//!
//! Unlike the eager [`crate::process::process_batch`], which returns only
//! after every file is done, [`process_stream`] yields each [`FileOutcome`]
//! as soon as its pipeline finishes. Files are still processed one at a
//! time, so outcomes arrive in intake order.
//!
//! Uploads refused at intake are logged and skipped; they produce no item.
//! The batch-level progress events are not fired, only the per-file ones.

use crate::config::ProcessOptions;
use crate::error::SweepError;
use crate::output::FileOutcome;
use crate::pipeline::intake::{self, UploadedFile};
use crate::process::process_indexed;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = Result<FileOutcome, SweepError>> + Send>>;

/// Process uploads, streaming outcomes in intake order.
///
/// Nothing runs until the stream is polled.
///
/// # Example
/// ```rust,no_run
/// use data_sweeper::{process_stream, ProcessOptions, UploadedFile};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![UploadedFile::new("a.csv", "x\n1\n")];
/// let mut outcomes = process_stream(files, &ProcessOptions::default());
/// while let Some(outcome) = outcomes.next().await {
///     println!("{}", outcome?.status);
/// }
/// # Ok(())
/// # }
/// ```
pub fn process_stream(files: Vec<UploadedFile>, options: &ProcessOptions) -> OutcomeStream {
    let intake = intake::accept(files);
    let total = intake.accepted.len();
    info!(
        "Starting streaming batch: {} files ({} refused at intake)",
        total,
        intake.rejected.len()
    );

    let options = options.clone();
    let s = stream::iter(intake.accepted.into_iter().enumerate()).then(move |(i, (kind, file))| {
        let opts = options.clone();
        async move { process_indexed(i + 1, total, kind, file, &opts).await }
    });

    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_arrive_in_intake_order() {
        let files = vec![
            UploadedFile::new("b.csv", "x\n1\n"),
            UploadedFile::new("skip.txt", "nope"),
            UploadedFile::new("a.pdf", "not a pdf"),
        ];
        let outcomes: Vec<_> = tokio_test::block_on(
            process_stream(files, &ProcessOptions::default()).collect::<Vec<_>>(),
        );

        let names: Vec<_> = outcomes
            .iter()
            .map(|o| o.as_ref().unwrap().file_name.as_str())
            .collect();
        assert_eq!(names, vec!["b.csv", "a.pdf"]);
        assert!(outcomes[0].as_ref().unwrap().succeeded());
        assert!(!outcomes[1].as_ref().unwrap().succeeded());
    }
}
