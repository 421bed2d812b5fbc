//! Pipeline configuration.
//!
//! [`PipelineOptions`] is a builder that threads the output root, the wanted
//! container, the temporary-file location and the event observer through
//! [`KeyframeExtractor`](crate::KeyframeExtractor) without widening every
//! signature. The defaults reproduce the fixed layout
//! `screenshot/{VideoID}/frame_{N}.jpg` from progressive MP4 streams.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use keyframer::{NoOpObserver, PipelineOptions};
//!
//! let options = PipelineOptions::new()
//!     .with_output_root("dataset/screenshot")
//!     .with_observer(Arc::new(NoOpObserver));
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    gate,
    observer::{LogObserver, PipelineEvent, PipelineObserver},
    video_id::VideoId,
};

/// Root directory holding one sub-directory per video.
pub const DEFAULT_OUTPUT_ROOT: &str = "screenshot";

/// Container a stream must use to be selected.
pub const DEFAULT_CONTAINER: &str = "mp4";

/// Settings shared by every video a [`KeyframeExtractor`](crate::KeyframeExtractor)
/// processes.
#[derive(Clone)]
pub struct PipelineOptions {
    pub(crate) output_root: PathBuf,
    pub(crate) container: String,
    /// `None` uses the system temporary directory.
    pub(crate) temp_dir: Option<PathBuf>,
    pub(crate) observer: Arc<dyn PipelineObserver>,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("output_root", &self.output_root)
            .field("container", &self.container)
            .field("temp_dir", &self.temp_dir)
            .field("has_observer", &true)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            container: DEFAULT_CONTAINER.to_string(),
            temp_dir: None,
            observer: Arc::new(LogObserver),
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write keyframes under `root` instead of `screenshot/`.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Select streams in `container` (matched case-insensitively).
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into().trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Park downloads in `directory` instead of the system temp directory.
    pub fn with_temp_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(directory.into());
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// `{output_root}/{video_id}`.
    pub fn output_directory(&self, video_id: &VideoId) -> PathBuf {
        gate::output_directory(&self.output_root, video_id)
    }

    pub(crate) fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_layout() {
        let options = PipelineOptions::new();
        assert_eq!(options.output_root(), Path::new("screenshot"));
        assert_eq!(options.container(), "mp4");

        let id = VideoId::new("abc").unwrap();
        assert_eq!(
            options.output_directory(&id),
            Path::new("screenshot").join("abc")
        );
    }

    #[test]
    fn container_is_normalised() {
        let options = PipelineOptions::new().with_container(".WebM");
        assert_eq!(options.container(), "webm");
    }

    #[test]
    fn debug_hides_observer() {
        let debug = format!("{:?}", PipelineOptions::new().with_temp_dir("/tmp/kf"));
        assert!(debug.contains("PipelineOptions"));
        assert!(debug.contains("has_observer: true"));
        assert!(debug.contains("/tmp/kf"));
    }
}
