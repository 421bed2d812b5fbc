//! Pipeline reporting.
//!
//! The pipeline never logs its outcomes through a global: it hands every
//! notable [`PipelineEvent`] to the [`PipelineObserver`] configured in
//! [`PipelineOptions`](crate::PipelineOptions). [`LogObserver`], the default,
//! forwards events to the `log` facade at `info`/`error` level.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use keyframer::{PipelineEvent, PipelineObserver, PipelineOptions};
//!
//! struct PrintObserver;
//!
//! impl PipelineObserver for PrintObserver {
//!     fn on_event(&self, event: &PipelineEvent) {
//!         println!("{event}");
//!     }
//! }
//!
//! let options = PipelineOptions::new().with_observer(Arc::new(PrintObserver));
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use log::Level;

/// Something that happened while processing one video.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PipelineEvent {
    /// The output directory already had entries.
    Skipped { video_id: String },
    /// A stream was selected and downloaded.
    Downloaded {
        video_id: String,
        format_id: String,
        byte_length: u64,
    },
    /// One keyframe was written.
    FrameWritten {
        video_id: String,
        timestamp_ms: f64,
        path: PathBuf,
    },
    /// One timestamp could not be decoded, even via the fallback.
    FrameFailed { video_id: String, seconds: u64 },
    /// All timestamps were attempted.
    Completed {
        video_id: String,
        frames_written: usize,
        frames_failed: usize,
    },
    /// The video was abandoned. Emitted by the batch driver.
    Failed { video_id: String, reason: String },
}

impl PipelineEvent {
    /// Severity used when the event is logged.
    pub fn level(&self) -> Level {
        match self {
            PipelineEvent::FrameFailed { .. } | PipelineEvent::Failed { .. } => Level::Error,
            PipelineEvent::FrameWritten { .. } | PipelineEvent::Downloaded { .. } => Level::Debug,
            PipelineEvent::Skipped { .. } | PipelineEvent::Completed { .. } => Level::Info,
        }
    }

    pub fn video_id(&self) -> &str {
        match self {
            PipelineEvent::Skipped { video_id }
            | PipelineEvent::Downloaded { video_id, .. }
            | PipelineEvent::FrameWritten { video_id, .. }
            | PipelineEvent::FrameFailed { video_id, .. }
            | PipelineEvent::Completed { video_id, .. }
            | PipelineEvent::Failed { video_id, .. } => video_id,
        }
    }
}

impl Display for PipelineEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PipelineEvent::Skipped { video_id } => {
                write!(f, "{video_id}: Screenshots already exist, skipping processing")
            }
            PipelineEvent::Downloaded {
                video_id,
                format_id,
                byte_length,
            } => write!(f, "{video_id}: Downloaded format {format_id} ({byte_length} bytes)"),
            PipelineEvent::FrameWritten {
                video_id,
                timestamp_ms,
                path,
            } => write!(
                f,
                "{video_id}: Wrote frame at {timestamp_ms:.0} ms to {}",
                path.display()
            ),
            PipelineEvent::FrameFailed { video_id, seconds } => write!(
                f,
                "{video_id}: Failed. Could not read frame at {seconds} seconds"
            ),
            PipelineEvent::Completed {
                video_id,
                frames_failed: 0,
                ..
            } => write!(f, "{video_id}: Keyframes generated successfully"),
            PipelineEvent::Completed {
                video_id,
                frames_written,
                frames_failed,
            } => write!(
                f,
                "{video_id}: Keyframes generated with {frames_failed} frame failures ({frames_written} written)"
            ),
            PipelineEvent::Failed { video_id, reason } => {
                write!(f, "{video_id}: An error occurred: {reason}")
            }
        }
    }
}

/// Receives [`PipelineEvent`]s.
///
/// Observers only watch; they cannot alter or stop processing.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent) {
        log::log!(event.level(), "{event}");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl PipelineObserver for NoOpObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_log_format() {
        let skipped = PipelineEvent::Skipped {
            video_id: "abc".into(),
        };
        assert_eq!(
            skipped.to_string(),
            "abc: Screenshots already exist, skipping processing"
        );

        let failed_frame = PipelineEvent::FrameFailed {
            video_id: "abc".into(),
            seconds: 38,
        };
        assert_eq!(
            failed_frame.to_string(),
            "abc: Failed. Could not read frame at 38 seconds"
        );
        assert_eq!(failed_frame.level(), Level::Error);
    }

    #[test]
    fn completion_mentions_failures_only_when_present() {
        let clean = PipelineEvent::Completed {
            video_id: "abc".into(),
            frames_written: 20,
            frames_failed: 0,
        };
        assert_eq!(clean.to_string(), "abc: Keyframes generated successfully");

        let partial = PipelineEvent::Completed {
            video_id: "abc".into(),
            frames_written: 19,
            frames_failed: 1,
        };
        assert!(partial.to_string().contains("1 frame failures"));
        assert_eq!(partial.video_id(), "abc");
    }
}
