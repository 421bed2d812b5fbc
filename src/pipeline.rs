//! The per-video pipeline.
//!
//! [`KeyframeExtractor::process_video`] runs three steps for one id:
//!
//! 1. **Gate**: skip when `{root}/{id}` already has entries, otherwise make sure
//!    it exists.
//! 2. **Acquire**: resolve streams, select a progressive one, download it to
//!    a temporary file.
//! 3. **Extract**: open the file, compute the [`KeyframeSchedule`], then seek,
//!    decode and write one JPEG per timestamp.
//!
//! The temporary file and the decoder are owned by `process_video`'s scope and
//! dropped on every exit path, including zero-fps and decode errors.
//!
//! A timestamp that cannot be decoded, even after retrying at the last frame,
//! or whose JPEG cannot be written, is recorded in
//! [`ExtractionReport::failures`] and processing continues.
//! Everything else that goes wrong is returned as a [`KeyframeError`]; the
//! caller decides whether to log and carry on.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use image::{DynamicImage, ImageFormat};

use crate::{
    acquire::{self, MediaStream, StreamSource, YoutubeSource},
    configuration::PipelineOptions,
    decode::{self, FfmpegOpener, FrameSource, MediaOpener, SeekPosition},
    error::KeyframeError,
    gate::{self, GateDecision},
    observer::PipelineEvent,
    schedule::{self, KeyframeSchedule},
    video_id::VideoId,
};

/// Why a timestamp produced no keyframe file.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameFailureCause {
    /// Neither the timestamp nor the last-frame fallback decoded.
    Unreadable,
    /// A frame was decoded but could not be encoded or written.
    WriteFailed(String),
}

/// A timestamp that produced no keyframe file.
///
/// Recorded in [`ExtractionReport::failures`]; never aborts the video.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFailure {
    /// Requested position in milliseconds from the start of the video.
    pub timestamp_ms: f64,
    /// `timestamp_ms` floored to whole seconds.
    pub seconds: u64,
    pub cause: FrameFailureCause,
}

impl From<&FrameFailure> for KeyframeError {
    fn from(failure: &FrameFailure) -> Self {
        match &failure.cause {
            FrameFailureCause::Unreadable => KeyframeError::FrameReadFailure {
                timestamp_ms: failure.timestamp_ms,
                seconds: failure.seconds,
            },
            FrameFailureCause::WriteFailed(reason) => KeyframeError::FrameWriteFailure {
                seconds: failure.seconds,
                reason: reason.clone(),
            },
        }
    }
}

/// What extraction produced for one video.
#[derive(Debug, Clone)]
#[must_use]
pub struct ExtractionReport {
    /// The video these keyframes belong to.
    pub video_id: VideoId,
    /// The stream that was downloaded.
    pub stream: MediaStream,
    pub schedule: KeyframeSchedule,
    /// Files written, in schedule order. A path appears twice when two
    /// timestamps share a second; the later write is the one on disk.
    pub frames_written: Vec<PathBuf>,
    /// Timestamps that yielded no file, in schedule order.
    pub failures: Vec<FrameFailure>,
}

impl ExtractionReport {
    /// Every timestamp produced a file.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of [`KeyframeExtractor::process_video`].
#[derive(Debug, Clone)]
#[must_use]
pub enum ProcessOutcome {
    /// Output already present; nothing was fetched or decoded.
    Skipped { existing_entries: usize },
    /// All timestamps were attempted.
    Completed(ExtractionReport),
}

/// Downloads videos and captures their keyframes.
///
/// Generic over the platform ([`StreamSource`]) and the decoder
/// ([`MediaOpener`]) so either can be swapped out.
///
/// # Example
///
/// ```no_run
/// use keyframer::{KeyframeExtractor, PipelineOptions, ProcessOutcome, VideoId};
///
/// let extractor = KeyframeExtractor::youtube(PipelineOptions::new())?;
/// let id = VideoId::new("dQw4w9WgXcQ")?;
/// match extractor.process_video(&id)? {
///     ProcessOutcome::Skipped { .. } => println!("already done"),
///     ProcessOutcome::Completed(report) => {
///         println!("{} frames", report.frames_written.len());
///     }
/// }
/// # Ok::<(), keyframer::KeyframeError>(())
/// ```
#[derive(Debug)]
pub struct KeyframeExtractor<S, O> {
    source: S,
    opener: O,
    options: PipelineOptions,
}

impl KeyframeExtractor<YoutubeSource, FfmpegOpener> {
    /// YouTube streams decoded with FFmpeg.
    pub fn youtube(options: PipelineOptions) -> Result<Self, KeyframeError> {
        Ok(Self::new(YoutubeSource::new()?, FfmpegOpener, options))
    }
}

impl<S: StreamSource, O: MediaOpener> KeyframeExtractor<S, O> {
    pub fn new(source: S, opener: O, options: PipelineOptions) -> Self {
        Self {
            source,
            opener,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Gate, acquire and extract keyframes for `video_id`.
    ///
    /// # Errors
    ///
    /// - [`KeyframeError::NoStreamFound`] if no progressive stream matches.
    ///   The output directory is left empty so a later run retries.
    /// - [`KeyframeError::AcquisitionFailure`] on platform/network errors.
    /// - [`KeyframeError::InvalidFrameRate`] if the decoder reports zero fps.
    /// - I/O or FFmpeg errors for the output directory, the temporary file or
    ///   opening the decoder.
    ///
    /// Unreadable timestamps and keyframe write errors are not returned; they
    /// land in [`ExtractionReport::failures`].
    pub fn process_video(&self, video_id: &VideoId) -> Result<ProcessOutcome, KeyframeError> {
        let output_directory = self.options.output_directory(video_id);

        if let GateDecision::AlreadyProcessed { existing_entries } =
            gate::check_and_prepare(&output_directory)?
        {
            self.options.emit(PipelineEvent::Skipped {
                video_id: video_id.to_string(),
            });
            return Ok(ProcessOutcome::Skipped { existing_entries });
        }

        let (stream, media) = acquire::acquire(
            &self.source,
            video_id,
            &self.options.container,
            self.options.temp_dir.as_deref(),
        )?;
        self.options.emit(PipelineEvent::Downloaded {
            video_id: video_id.to_string(),
            format_id: stream.format_id.clone(),
            byte_length: media.byte_length(),
        });

        let (schedule, frames_written, failures) =
            self.extract(video_id, media.path(), &output_directory)?;
        drop(media);

        self.options.emit(PipelineEvent::Completed {
            video_id: video_id.to_string(),
            frames_written: frames_written.len(),
            frames_failed: failures.len(),
        });

        Ok(ProcessOutcome::Completed(ExtractionReport {
            video_id: video_id.clone(),
            stream,
            schedule,
            frames_written,
            failures,
        }))
    }

    fn extract(
        &self,
        video_id: &VideoId,
        media_path: &Path,
        output_directory: &Path,
    ) -> Result<(KeyframeSchedule, Vec<PathBuf>, Vec<FrameFailure>), KeyframeError> {
        let mut source = self.opener.open(media_path)?;
        let schedule = KeyframeSchedule::new(source.frame_count(), source.frames_per_second())?;

        log::debug!(
            "{video_id}: {} frames at {:.3} fps, {:.0} ms, interval {:.0} ms",
            schedule.frame_count(),
            schedule.frames_per_second(),
            schedule.total_duration_ms(),
            schedule.interval_ms(),
        );

        let mut frames_written = Vec::with_capacity(schedule.timestamps().len());
        let mut failures = Vec::new();

        for &timestamp_ms in schedule.timestamps() {
            let seconds = schedule::timestamp_seconds(timestamp_ms);
            let path = output_directory.join(schedule::frame_file_name(timestamp_ms));

            let cause = match capture(source.as_mut(), timestamp_ms, schedule.last_frame_index()) {
                Some(frame) => match write_jpeg(&frame, &path) {
                    Ok(()) => {
                        self.options.emit(PipelineEvent::FrameWritten {
                            video_id: video_id.to_string(),
                            timestamp_ms,
                            path: path.clone(),
                        });
                        frames_written.push(path);
                        continue;
                    }
                    Err(error) => FrameFailureCause::WriteFailed(error.to_string()),
                },
                None => FrameFailureCause::Unreadable,
            };

            let failure = FrameFailure {
                timestamp_ms,
                seconds,
                cause,
            };
            log::warn!("{video_id}: {}", KeyframeError::from(&failure));
            self.options.emit(PipelineEvent::FrameFailed {
                video_id: video_id.to_string(),
                seconds,
            });
            failures.push(failure);
        }

        Ok((schedule, frames_written, failures))
    }
}

/// Encode `frame` as JPEG in memory, then write it to `path`.
///
/// Encoding first leaves an earlier file of the same name intact when the
/// frame cannot be encoded.
fn write_jpeg(frame: &DynamicImage, path: &Path) -> Result<(), KeyframeError> {
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(frame.to_rgb8()).write_to(&mut encoded, ImageFormat::Jpeg)?;
    fs::write(path, encoded.into_inner())?;
    Ok(())
}

/// Read the frame at `timestamp_ms`, retrying once at the last frame.
///
/// Timestamps near the end can land past the last readable position; the
/// final frame stands in for them.
fn capture(
    source: &mut dyn FrameSource,
    timestamp_ms: f64,
    last_frame_index: u64,
) -> Option<DynamicImage> {
    decode::read_at(source, SeekPosition::Millis(timestamp_ms))
        .or_else(|| decode::read_at(source, SeekPosition::Frame(last_frame_index)))
}
