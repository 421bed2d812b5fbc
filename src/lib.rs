//! # keyframer
//!
//! Download videos by ID and capture evenly-spaced keyframes to disk.
//!
//! For each video, `keyframer` resolves a progressive MP4 stream, downloads
//! it to a temporary file, and writes 20 JPEG stills taken at 5%, 10%, …
//! 100% of its duration to `screenshot/{VideoID}/frame_{seconds}.jpg`.
//! Videos whose output directory already holds files are skipped, so a batch
//! can be re-run until everything is done.
//!
//! Decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; stream
//! discovery goes through `yt-dlp`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use keyframer::{KeyframeExtractor, PipelineOptions, VideoId};
//!
//! let extractor = KeyframeExtractor::youtube(PipelineOptions::new())?;
//! let outcome = extractor.process_video(&VideoId::new("dQw4w9WgXcQ")?)?;
//! println!("{outcome:?}");
//! # Ok::<(), keyframer::KeyframeError>(())
//! ```
//!
//! ### Batches
//!
//! ```no_run
//! use keyframer::{KeyframeExtractor, PipelineOptions, batch};
//!
//! let ids = batch::load_video_ids("ids.csv", batch::DEFAULT_ID_COLUMN)?;
//! let extractor = KeyframeExtractor::youtube(PipelineOptions::new())?;
//! let summary = batch::run_batch(&extractor, &ids, |_, _| {});
//! # Ok::<(), keyframer::KeyframeError>(())
//! ```
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed, and `yt-dlp` must be on
//! `PATH` (or passed explicitly) for the YouTube source.

pub mod acquire;
pub mod batch;
pub mod configuration;
mod conversion;
pub mod decode;
pub mod error;
pub mod ffmpeg;
pub mod gate;
pub mod logger;
pub mod observer;
pub mod pipeline;
pub mod schedule;
pub mod video_id;

pub use acquire::{DownloadedMedia, MediaStream, StreamSource, YoutubeSource, select_stream};
pub use batch::{BatchSummary, load_video_ids, run_batch};
pub use configuration::PipelineOptions;
pub use decode::{FfmpegOpener, FfmpegSource, FrameSource, MediaOpener, SeekPosition};
pub use error::KeyframeError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use gate::GateDecision;
pub use logger::FileLogger;
pub use observer::{LogObserver, NoOpObserver, PipelineEvent, PipelineObserver};
pub use pipeline::{
    ExtractionReport, FrameFailure, FrameFailureCause, KeyframeExtractor, ProcessOutcome,
};
pub use schedule::{KEYFRAME_COUNT, KeyframeSchedule, frame_file_name};
pub use video_id::VideoId;
