//! Internal conversion helpers.
//!
//! Timestamp arithmetic between milliseconds, FFmpeg time bases and
//! AV_TIME_BASE, plus copying decoded pixel planes into tight buffers.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// This strips it so the result can go straight into
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// `numerator / denominator`, or `None` for a zero denominator.
pub(crate) fn rational_to_f64(rate: Rational) -> Option<f64> {
    if rate.denominator() == 0 {
        None
    } else {
        Some(rate.numerator() as f64 / rate.denominator() as f64)
    }
}

/// Milliseconds (clamped at zero) as a [`Duration`].
pub(crate) fn millis_to_duration(milliseconds: f64) -> Duration {
    if milliseconds.is_finite() && milliseconds > 0.0 {
        Duration::from_secs_f64(milliseconds / 1000.0)
    } else {
        Duration::ZERO
    }
}

/// Frame index to milliseconds at `frames_per_second`.
pub(crate) fn frame_index_to_millis(frame_index: u64, frames_per_second: f64) -> f64 {
    if frames_per_second > 0.0 {
        frame_index as f64 / frames_per_second * 1000.0
    } else {
        0.0
    }
}

/// A [`Duration`] in the stream's time base, for comparing against frame PTS.
pub(crate) fn duration_to_stream_timestamp(duration: Duration, time_base: Rational) -> i64 {
    let seconds = duration.as_secs_f64();
    let numerator = time_base.numerator() as f64;
    let denominator = time_base.denominator() as f64;
    if numerator == 0.0 {
        return 0;
    }
    (seconds * denominator / numerator) as i64
}

/// A [`Duration`] in AV_TIME_BASE (microseconds).
///
/// `Input::seek` with no stream index expects this unit.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros() as i64
}
