//! Batch driving.
//!
//! Loads video ids from a CSV file and feeds them to a
//! [`KeyframeExtractor`] one at a time. Failures are reported through the
//! extractor's observer and counted; they never stop the batch.
//!
//! # Example
//!
//! ```no_run
//! use keyframer::{KeyframeExtractor, PipelineOptions, batch};
//!
//! let ids = batch::load_video_ids("duration_set_4.csv", "videoId")?;
//! let extractor = KeyframeExtractor::youtube(PipelineOptions::new())?;
//! let summary = batch::run_batch(&extractor, &ids, |_, _| {});
//! println!("{} completed, {} failed", summary.completed, summary.failed);
//! # Ok::<(), keyframer::KeyframeError>(())
//! ```

use std::path::Path;

use csv::ReaderBuilder;

use crate::{
    acquire::StreamSource,
    decode::MediaOpener,
    error::KeyframeError,
    observer::PipelineEvent,
    pipeline::{KeyframeExtractor, ProcessOutcome},
    video_id::VideoId,
};

/// Column holding composite ids in the input CSV.
pub const DEFAULT_ID_COLUMN: &str = "videoId";

/// Read composite ids from `column` of the CSV at `path`.
///
/// Rows whose value has no `:` delimiter or yields an unusable id are
/// logged at `warn` and skipped. Order and duplicates are preserved.
///
/// # Errors
///
/// Returns [`KeyframeError::InputList`] if the file cannot be parsed or has
/// no such column.
pub fn load_video_ids<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<VideoId>, KeyframeError> {
    let path = path.as_ref();
    let list_error = |reason: String| KeyframeError::InputList {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|error| list_error(error.to_string()))?;

    let column_index = reader
        .headers()
        .map_err(|error| list_error(error.to_string()))?
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| list_error(format!("no column named {column:?}")))?;

    let mut ids = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|error| list_error(error.to_string()))?;
        let Some(composite) = record.get(column_index) else {
            log::warn!("Row {}: missing {column:?} value", row + 1);
            continue;
        };
        match VideoId::from_composite(composite) {
            Ok(id) => ids.push(id),
            Err(error) => log::warn!("Row {}: {error}", row + 1),
        }
    }

    log::info!("Loaded {} video ids from {}", ids.len(), path.display());
    Ok(ids)
}

/// Counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub frames_written: usize,
    pub frame_failures: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Process `ids` in order, one at a time.
///
/// `on_done` runs after each id with its result, e.g. to tick a progress bar.
/// Terminal errors are sent to the observer as [`PipelineEvent::Failed`].
pub fn run_batch<S, O, F>(
    extractor: &KeyframeExtractor<S, O>,
    ids: &[VideoId],
    mut on_done: F,
) -> BatchSummary
where
    S: StreamSource,
    O: MediaOpener,
    F: FnMut(&VideoId, &Result<ProcessOutcome, KeyframeError>),
{
    let mut summary = BatchSummary::default();

    for id in ids {
        let result = extractor.process_video(id);
        match &result {
            Ok(ProcessOutcome::Skipped { .. }) => summary.skipped += 1,
            Ok(ProcessOutcome::Completed(report)) => {
                summary.completed += 1;
                summary.frames_written += report.frames_written.len();
                summary.frame_failures += report.failures.len();
            }
            Err(error) => {
                summary.failed += 1;
                extractor.options().emit(PipelineEvent::Failed {
                    video_id: id.to_string(),
                    reason: error.to_string(),
                });
            }
        }
        on_done(id, &result);
    }

    log::info!(
        "Batch finished: {} completed, {} skipped, {} failed",
        summary.completed,
        summary.skipped,
        summary.failed
    );
    summary
}
