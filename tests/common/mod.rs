//! Scripted stand-ins for the platform and the decoder.
//!
//! Every fake counts its calls through shared atomics so tests can assert
//! that skipped videos never touch the network or the decoder.

#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use image::{DynamicImage, Rgb, RgbImage};
use keyframer::{
    FrameSource, KeyframeError, MediaOpener, MediaStream, PipelineEvent, PipelineObserver,
    SeekPosition, StreamSource, VideoId,
};

pub fn stream(format_id: &str, container: &str, progressive: bool) -> MediaStream {
    MediaStream {
        format_id: format_id.to_string(),
        container: container.to_string(),
        progressive,
        url: format!("https://media.example/{format_id}"),
        byte_length: Some(4),
        http_headers: Vec::new(),
    }
}

/// Serves a fixed stream list and a fixed payload.
#[derive(Clone)]
pub struct ScriptedSource {
    pub streams: Vec<MediaStream>,
    pub payload: Vec<u8>,
    /// Ids whose resolution fails with an acquisition error.
    pub unreachable: Vec<String>,
    pub resolve_calls: Arc<AtomicUsize>,
    pub fetch_calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(streams: Vec<MediaStream>) -> Self {
        Self {
            streams,
            payload: b"fake".to_vec(),
            unreachable: Vec::new(),
            resolve_calls: Arc::new(AtomicUsize::new(0)),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// One progressive MP4 stream.
    pub fn progressive_mp4() -> Self {
        Self::new(vec![stream("137", "mp4", false), stream("18", "mp4", true)])
    }

    pub fn with_unreachable(mut self, video_id: &str) -> Self {
        self.unreachable.push(video_id.to_string());
        self
    }

    pub fn resolves(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl StreamSource for ScriptedSource {
    fn resolve(&self, video_id: &VideoId) -> Result<Vec<MediaStream>, KeyframeError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.iter().any(|id| id == video_id.as_str()) {
            return Err(KeyframeError::AcquisitionFailure(format!(
                "{video_id} is unavailable"
            )));
        }
        Ok(self.streams.clone())
    }

    fn fetch(&self, _stream: &MediaStream) -> Result<Vec<u8>, KeyframeError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.payload.clone())
    }
}

/// Opens [`ScriptedFrames`] regardless of the file contents.
#[derive(Clone)]
pub struct ScriptedOpener {
    pub frame_count: u64,
    pub frames_per_second: f64,
    /// Millisecond positions that decode to nothing.
    pub unreadable_millis: Vec<f64>,
    /// Whether the last-frame fallback also decodes to nothing.
    pub fallback_fails: bool,
    /// Millisecond positions that decode to a frame too wide for JPEG.
    pub unencodable_millis: Vec<f64>,
    pub open_calls: Arc<AtomicUsize>,
    /// Paths handed to `open`, in order.
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
    /// Frames produced so far across every opened source.
    pub frames_read: Arc<AtomicUsize>,
}

impl ScriptedOpener {
    pub fn new(frame_count: u64, frames_per_second: f64) -> Self {
        Self {
            frame_count,
            frames_per_second,
            unreadable_millis: Vec::new(),
            fallback_fails: false,
            unencodable_millis: Vec::new(),
            open_calls: Arc::new(AtomicUsize::new(0)),
            opened: Arc::new(Mutex::new(Vec::new())),
            frames_read: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_unreadable(mut self, milliseconds: f64) -> Self {
        self.unreadable_millis.push(milliseconds);
        self
    }

    pub fn with_unencodable(mut self, milliseconds: f64) -> Self {
        self.unencodable_millis.push(milliseconds);
        self
    }

    pub fn with_failing_fallback(mut self) -> Self {
        self.fallback_fails = true;
        self
    }

    pub fn opens(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn opened_paths(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl MediaOpener for ScriptedOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, KeyframeError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "media file must exist while it is decoded");
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(Box::new(ScriptedFrames {
            script: self.clone(),
            position: None,
        }))
    }
}

/// Gray level of the `index`-th frame produced by a [`ScriptedOpener`].
pub fn gray_level(index: usize) -> u8 {
    (10 + index * 12) as u8
}

pub struct ScriptedFrames {
    script: ScriptedOpener,
    position: Option<SeekPosition>,
}

impl FrameSource for ScriptedFrames {
    fn frame_count(&self) -> u64 {
        self.script.frame_count
    }

    fn frames_per_second(&self) -> f64 {
        self.script.frames_per_second
    }

    fn seek(&mut self, position: SeekPosition) -> Result<(), KeyframeError> {
        self.position = Some(position);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<DynamicImage>, KeyframeError> {
        let position = self.position.take();
        let at_listed = |listed: &[f64]| match position {
            Some(SeekPosition::Millis(milliseconds)) => listed
                .iter()
                .any(|candidate| (candidate - milliseconds).abs() < 0.5),
            _ => false,
        };

        let readable = match position {
            Some(SeekPosition::Frame(_)) => !self.script.fallback_fails,
            _ => !at_listed(&self.script.unreadable_millis),
        };
        if !readable {
            return Ok(None);
        }

        let index = self.script.frames_read.fetch_add(1, Ordering::SeqCst);
        let level = gray_level(index);
        // JPEG dimensions are limited to 65535 pixels.
        let width = if at_listed(&self.script.unencodable_millis) {
            65_536
        } else {
            16
        };
        let image = RgbImage::from_pixel(width, 16, Rgb([level, level, level]));
        Ok(Some(DynamicImage::ImageRgb8(image)))
    }
}

/// Keeps every event it is handed.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Sorted file names directly under `directory`.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
