//! Frame decoding.
//!
//! [`FrameSource`] is an open, seekable handle on decoded video: it reports
//! the frame count and frame rate, seeks by milliseconds or frame index, and
//! decodes one frame at a time. [`MediaOpener`] produces sources from a file
//! path. The FFmpeg-backed pair is [`FfmpegOpener`] / [`FfmpegSource`].
//!
//! Sources are released by dropping them.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{conversion, error::KeyframeError};

/// Where to move a [`FrameSource`]'s read position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekPosition {
    /// Offset from the start of the video in milliseconds.
    Millis(f64),
    /// Zero-based frame index.
    Frame(u64),
}

/// An open, seekable handle on decoded video.
pub trait FrameSource {
    /// Total number of decodable frames.
    fn frame_count(&self) -> u64;

    /// Frames per second. Zero when the container does not say.
    fn frames_per_second(&self) -> f64;

    /// Move the read position.
    fn seek(&mut self, position: SeekPosition) -> Result<(), KeyframeError>;

    /// Decode the frame at the read position.
    ///
    /// Returns `Ok(None)` when the stream ends before a frame is produced.
    fn read_frame(&mut self) -> Result<Option<DynamicImage>, KeyframeError>;
}

/// Opens [`FrameSource`]s from files on disk.
pub trait MediaOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, KeyframeError>;
}

/// Seek to `position` and decode one frame, folding errors into `None`.
pub(crate) fn read_at(source: &mut dyn FrameSource, position: SeekPosition) -> Option<DynamicImage> {
    let result = source
        .seek(position)
        .and_then(|()| source.read_frame());
    match result {
        Ok(frame) => frame,
        Err(error) => {
            log::debug!("Read at {position:?} failed: {error}");
            None
        }
    }
}

/// [`MediaOpener`] backed by FFmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl MediaOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, KeyframeError> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

/// FFmpeg demuxer + decoder for the best video stream of a file.
///
/// Seeks land on the keyframe at or before the target; [`read_frame`]
/// then decodes forward to the first frame whose PTS reaches the target.
///
/// [`read_frame`]: FrameSource::read_frame
pub struct FfmpegSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    frame_count: u64,
    frames_per_second: f64,
    width: u32,
    height: u32,
    /// PTS the next returned frame must reach, set by `seek`.
    target_pts: Option<i64>,
    /// EOF has been sent to the decoder since the last seek.
    drained: bool,
    file_path: PathBuf,
}

impl Debug for FfmpegSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FfmpegSource")
            .field("stream_index", &self.stream_index)
            .field("frame_count", &self.frame_count)
            .field("frames_per_second", &self.frames_per_second)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl FfmpegSource {
    /// Open `path` and prepare a decoder for its best video stream.
    ///
    /// # Errors
    ///
    /// - [`KeyframeError::FileOpen`] if FFmpeg cannot open the file.
    /// - [`KeyframeError::NoVideoStream`] if it has no video.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KeyframeError> {
        let file_path = path.as_ref().to_path_buf();
        let open_error = |reason: String| KeyframeError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        // Safe to call repeatedly.
        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| open_error(error.to_string()))?;

        let container_duration = match input_context.duration() {
            micros if micros > 0 => Duration::from_micros(micros as u64),
            _ => Duration::ZERO,
        };

        let (stream_index, time_base, frames_per_second, declared_frames, decoder) = {
            let stream = input_context
                .streams()
                .best(Type::Video)
                .ok_or(KeyframeError::NoVideoStream)?;

            let frames_per_second = conversion::rational_to_f64(stream.avg_frame_rate())
                .filter(|rate| *rate > 0.0)
                .or_else(|| conversion::rational_to_f64(stream.rate()))
                .unwrap_or(0.0);

            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| open_error(format!("Failed to create video decoder: {error}")))?;

            (
                stream.index(),
                stream.time_base(),
                frames_per_second,
                stream.frames(),
                decoder,
            )
        };

        let frame_count = if declared_frames > 0 {
            declared_frames as u64
        } else {
            (container_duration.as_secs_f64() * frames_per_second) as u64
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Opened {}: stream={}, {}x{}, {:.3} fps, {} frames",
            file_path.display(),
            stream_index,
            width,
            height,
            frames_per_second,
            frame_count,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            stream_index,
            time_base,
            frame_count,
            frames_per_second,
            width,
            height,
            target_pts: None,
            drained: false,
            file_path,
        })
    }

    fn accepts(&self, frame: &VideoFrame) -> bool {
        match (self.target_pts, frame.pts()) {
            (Some(target), Some(pts)) => pts >= target,
            _ => true,
        }
    }

    fn to_image(&mut self, decoded: &VideoFrame) -> Result<DynamicImage, KeyframeError> {
        let mut rgb_frame = VideoFrame::empty();
        self.scaler.run(decoded, &mut rgb_frame)?;
        let buffer = conversion::frame_to_rgb_buffer(&rgb_frame, self.width, self.height);
        let image = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            KeyframeError::FfmpegError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })?;
        Ok(DynamicImage::ImageRgb8(image))
    }
}

impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn frames_per_second(&self) -> f64 {
        self.frames_per_second
    }

    fn seek(&mut self, position: SeekPosition) -> Result<(), KeyframeError> {
        let milliseconds = match position {
            SeekPosition::Millis(milliseconds) => milliseconds,
            SeekPosition::Frame(index) => {
                conversion::frame_index_to_millis(index, self.frames_per_second)
            }
        };
        let target = conversion::millis_to_duration(milliseconds);
        let seek_timestamp = conversion::duration_to_seek_timestamp(target);

        self.input_context.seek(seek_timestamp, ..seek_timestamp)?;
        self.decoder.flush();
        self.drained = false;
        self.target_pts = Some(conversion::duration_to_stream_timestamp(
            target,
            self.time_base,
        ));
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, KeyframeError> {
        let stream_index = self.stream_index;
        let mut decoded = VideoFrame::empty();

        loop {
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                if self.accepts(&decoded) {
                    self.target_pts = None;
                    return self.to_image(&decoded).map(Some);
                }
            }

            if self.drained {
                return Ok(None);
            }

            let next_packet = self
                .input_context
                .packets()
                .find(|(stream, _)| stream.index() == stream_index)
                .map(|(_, packet)| packet);

            match next_packet {
                Some(packet) => self.decoder.send_packet(&packet)?,
                None => {
                    self.decoder.send_eof()?;
                    self.drained = true;
                }
            }
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        log::debug!("Released decoder for {}", self.file_path.display());
    }
}
