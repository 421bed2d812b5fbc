//! Error types for the `keyframer` crate.
//!
//! This module defines [`KeyframeError`], the unified error type returned by
//! every fallible operation in the crate. Terminal variants abort the current
//! video; [`KeyframeError::FrameReadFailure`] and
//! [`KeyframeError::FrameWriteFailure`] describe entries of an
//! [`ExtractionReport`](crate::ExtractionReport) and are never returned.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `keyframer` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KeyframeError {
    /// No progressive stream in the requested container exists for the video.
    #[error("{video_id}: No suitable stream found")]
    NoStreamFound {
        /// The video whose streams were inspected.
        video_id: String,
    },

    /// The decoder reported a frame rate from which no duration can be derived.
    #[error(
        "FPS value is {frames_per_second}, cannot calculate total duration ({frame_count} frames)"
    )]
    InvalidFrameRate {
        /// Frame count reported by the decoder.
        frame_count: u64,
        /// The offending frame rate.
        frames_per_second: f64,
    },

    /// A single timestamp could not be decoded, even after the end-of-stream
    /// fallback.
    #[error("Could not read frame at {seconds} seconds ({timestamp_ms:.1} ms)")]
    FrameReadFailure {
        /// Requested position in milliseconds.
        timestamp_ms: f64,
        /// The position floored to whole seconds, as used in file names.
        seconds: u64,
    },

    /// A decoded keyframe could not be encoded or written.
    #[error("Could not write frame at {seconds} seconds: {reason}")]
    FrameWriteFailure {
        /// The position floored to whole seconds, as used in file names.
        seconds: u64,
        /// Underlying encoder or I/O error.
        reason: String,
    },

    /// Resolving or fetching the media stream failed.
    #[error("Failed to acquire media stream: {0}")]
    AcquisitionFailure(String),

    /// The identifier is empty or not usable as a directory name.
    #[error("Invalid video id: {0:?}")]
    InvalidVideoId(String),

    /// The downloaded media file could not be opened for decoding.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path handed to the decoder.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The media file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The list of video ids could not be read.
    #[error("Failed to read video id list at {path}: {reason}")]
    InputList {
        /// Path of the id list.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a keyframe.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl KeyframeError {
    /// Whether this error ends processing of the current video.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            KeyframeError::FrameReadFailure { .. } | KeyframeError::FrameWriteFailure { .. }
        )
    }
}

impl From<FfmpegError> for KeyframeError {
    fn from(error: FfmpegError) -> Self {
        KeyframeError::FfmpegError(error.to_string())
    }
}

impl From<reqwest::Error> for KeyframeError {
    fn from(error: reqwest::Error) -> Self {
        KeyframeError::AcquisitionFailure(error.to_string())
    }
}

impl From<youtube_dl::Error> for KeyframeError {
    fn from(error: youtube_dl::Error) -> Self {
        KeyframeError::AcquisitionFailure(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::KeyframeError;

    #[test]
    fn only_frame_failures_are_recoverable() {
        let frame = KeyframeError::FrameReadFailure {
            timestamp_ms: 2000.0,
            seconds: 2,
        };
        assert!(!frame.is_terminal());

        let write = KeyframeError::FrameWriteFailure {
            seconds: 2,
            reason: "disk full".to_string(),
        };
        assert!(!write.is_terminal());

        let stream = KeyframeError::NoStreamFound {
            video_id: "abc".to_string(),
        };
        assert!(stream.is_terminal());
        assert!(KeyframeError::AcquisitionFailure("timeout".into()).is_terminal());
    }

    #[test]
    fn messages_name_the_video() {
        let error = KeyframeError::NoStreamFound {
            video_id: "dQw4w9WgXcQ".to_string(),
        };
        assert_eq!(error.to_string(), "dQw4w9WgXcQ: No suitable stream found");
    }
}
