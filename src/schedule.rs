//! Keyframe timestamp scheduling.
//!
//! A [`KeyframeSchedule`] spreads [`KEYFRAME_COUNT`] capture points evenly
//! over a video's duration: 5%, 10%, … 100%. The duration is derived from
//! the decoder's frame count and frame rate, so a zero frame rate is rejected
//! before anything is decoded.
//!
//! # Example
//!
//! ```
//! use keyframer::KeyframeSchedule;
//!
//! let schedule = KeyframeSchedule::new(1200, 30.0)?;
//! assert_eq!(schedule.total_duration_ms(), 40_000.0);
//! assert_eq!(schedule.timestamps()[0], 2_000.0);
//! assert_eq!(schedule.timestamps()[19], 40_000.0);
//! # Ok::<(), keyframer::KeyframeError>(())
//! ```

use crate::error::KeyframeError;

/// Number of keyframes captured per video.
pub const KEYFRAME_COUNT: usize = 20;

/// The ordered capture timestamps for one video, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct KeyframeSchedule {
    frame_count: u64,
    frames_per_second: f64,
    total_duration_ms: f64,
    timestamps: Vec<f64>,
}

impl KeyframeSchedule {
    /// Compute the schedule for a video of `frame_count` frames at
    /// `frames_per_second`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyframeError::InvalidFrameRate`] when `frames_per_second`
    /// is zero, negative, or not finite.
    pub fn new(frame_count: u64, frames_per_second: f64) -> Result<Self, KeyframeError> {
        if !frames_per_second.is_finite() || frames_per_second <= 0.0 {
            return Err(KeyframeError::InvalidFrameRate {
                frame_count,
                frames_per_second,
            });
        }

        let total_duration_ms = frame_count as f64 / frames_per_second * 1000.0;
        let interval = total_duration_ms / KEYFRAME_COUNT as f64;
        let timestamps = (1..=KEYFRAME_COUNT)
            .map(|step| interval * step as f64)
            .collect();

        Ok(Self {
            frame_count,
            frames_per_second,
            total_duration_ms,
            timestamps,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    /// `frame_count / fps * 1000`.
    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    /// Spacing between consecutive timestamps.
    pub fn interval_ms(&self) -> f64 {
        self.total_duration_ms / KEYFRAME_COUNT as f64
    }

    /// Capture points in ascending order; always [`KEYFRAME_COUNT`] long.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Index of the last decodable frame, used by the end-of-stream fallback.
    pub fn last_frame_index(&self) -> u64 {
        self.frame_count.saturating_sub(1)
    }
}

/// Whole seconds of a millisecond timestamp, rounded down.
pub fn timestamp_seconds(timestamp_ms: f64) -> u64 {
    (timestamp_ms / 1000.0).floor().max(0.0) as u64
}

/// File name for the keyframe captured at `timestamp_ms`.
///
/// Timestamps inside the same second share a name; the later write wins.
pub fn frame_file_name(timestamp_ms: f64) -> String {
    format!("frame_{}.jpg", timestamp_seconds(timestamp_ms))
}
