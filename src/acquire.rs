//! Stream acquisition.
//!
//! Resolves a [`VideoId`] to its available [`MediaStream`]s, picks the first
//! progressive stream in the wanted container, and downloads it in full.
//! The decoder needs random access by path, so the bytes land in a
//! [`DownloadedMedia`] temporary file that is deleted when dropped.
//!
//! [`StreamSource`] is the seam between the pipeline and the video platform.
//! [`YoutubeSource`] is the production implementation: format discovery
//! through `yt-dlp` (via the `youtube_dl` crate) and a blocking `reqwest`
//! fetch of the selected format URL.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::blocking::RequestBuilder;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};
use youtube_dl::{Format, YoutubeDl, YoutubeDlOutput};

use crate::{error::KeyframeError, video_id::VideoId};

/// One encoded resource a video is available as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    /// Platform format identifier (e.g. `"18"`).
    pub format_id: String,
    /// Container extension, lowercase (e.g. `"mp4"`, `"webm"`).
    pub container: String,
    /// Whether audio and video share this single container.
    pub progressive: bool,
    /// Direct download URL.
    pub url: String,
    /// Size in bytes, when the platform reports it.
    pub byte_length: Option<u64>,
    /// Request headers the platform expects when `url` is fetched.
    pub http_headers: Vec<(String, String)>,
}

/// Something that can list and download the streams of a video.
pub trait StreamSource {
    /// List every stream the platform offers for `video_id`.
    fn resolve(&self, video_id: &VideoId) -> Result<Vec<MediaStream>, KeyframeError>;

    /// Download `stream` completely into memory.
    fn fetch(&self, stream: &MediaStream) -> Result<Vec<u8>, KeyframeError>;
}

/// Pick the first progressive stream whose container is `container`.
pub fn select_stream<'a>(streams: &'a [MediaStream], container: &str) -> Option<&'a MediaStream> {
    streams
        .iter()
        .find(|stream| stream.progressive && stream.container.eq_ignore_ascii_case(container))
}

/// A fully downloaded stream, parked in a temporary file.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct DownloadedMedia {
    file: NamedTempFile,
    byte_length: u64,
}

impl DownloadedMedia {
    /// Write `bytes` to a fresh temporary file ending in `.{container}`.
    ///
    /// `directory` overrides the system temporary directory.
    pub fn persist(
        bytes: &[u8],
        container: &str,
        directory: Option<&Path>,
    ) -> Result<Self, KeyframeError> {
        let suffix = format!(".{container}");
        let mut builder = TempFileBuilder::new();
        builder.prefix("keyframer-").suffix(&suffix);
        let mut file = match directory {
            Some(directory) => builder.tempfile_in(directory)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        log::debug!(
            "Wrote {} bytes to temporary file {}",
            bytes.len(),
            file.path().display()
        );

        Ok(Self {
            file,
            byte_length: bytes.len() as u64,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn byte_length(&self) -> u64 {
        self.byte_length
    }
}

/// Acquire `video_id`: resolve, select, fetch, and park it on disk.
///
/// # Errors
///
/// - [`KeyframeError::NoStreamFound`] when nothing matches `container`.
/// - [`KeyframeError::AcquisitionFailure`] for platform or network errors.
pub(crate) fn acquire<S: StreamSource + ?Sized>(
    source: &S,
    video_id: &VideoId,
    container: &str,
    temp_dir: Option<&Path>,
) -> Result<(MediaStream, DownloadedMedia), KeyframeError> {
    let streams = source.resolve(video_id)?;
    log::debug!("{video_id}: {} streams available", streams.len());

    let stream = select_stream(&streams, container)
        .cloned()
        .ok_or_else(|| KeyframeError::NoStreamFound {
            video_id: video_id.to_string(),
        })?;

    log::debug!(
        "{video_id}: selected format {} ({}, {} bytes)",
        stream.format_id,
        stream.container,
        stream
            .byte_length
            .map_or_else(|| "unknown".to_string(), |length| length.to_string()),
    );

    let bytes = source.fetch(&stream)?;
    let media = DownloadedMedia::persist(&bytes, &stream.container, temp_dir)?;
    Ok((stream, media))
}

/// Production [`StreamSource`] backed by `yt-dlp` and `reqwest`.
#[derive(Debug)]
pub struct YoutubeSource {
    client: reqwest::blocking::Client,
    yt_dlp_path: Option<PathBuf>,
}

impl YoutubeSource {
    /// Create a source using `yt-dlp` from `PATH`.
    pub fn new() -> Result<Self, KeyframeError> {
        // Whole-video downloads can be large; no overall request timeout.
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()?;
        Ok(Self {
            client,
            yt_dlp_path: None,
        })
    }

    /// Use a specific `yt-dlp` executable.
    pub fn with_yt_dlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.yt_dlp_path = Some(path.into());
        self
    }
}

impl YoutubeSource {
    fn request(&self, stream: &MediaStream) -> RequestBuilder {
        stream
            .http_headers
            .iter()
            .fold(self.client.get(&stream.url), |request, (name, value)| {
                request.header(name.as_str(), value.as_str())
            })
    }
}

impl StreamSource for YoutubeSource {
    fn resolve(&self, video_id: &VideoId) -> Result<Vec<MediaStream>, KeyframeError> {
        let url = video_id.watch_url();
        log::info!("{video_id}: resolving streams for {url}");

        let mut command = YoutubeDl::new(url);
        if let Some(path) = &self.yt_dlp_path {
            command.youtube_dl_path(path);
        }

        let video = match command.run()? {
            YoutubeDlOutput::SingleVideo(video) => video,
            YoutubeDlOutput::Playlist(_) => {
                return Err(KeyframeError::AcquisitionFailure(format!(
                    "{video_id} resolved to a playlist, not a single video"
                )));
            }
        };

        Ok(video
            .formats
            .unwrap_or_default()
            .iter()
            .filter_map(media_stream_from_format)
            .collect())
    }

    fn fetch(&self, stream: &MediaStream) -> Result<Vec<u8>, KeyframeError> {
        let response = self
            .request(stream)
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;
        log::debug!("Fetched format {} ({} bytes)", stream.format_id, bytes.len());
        Ok(bytes.to_vec())
    }
}

fn media_stream_from_format(format: &Format) -> Option<MediaStream> {
    let url = format.url.clone()?;
    let has_codec = |codec: &Option<String>| {
        codec
            .as_deref()
            .is_some_and(|name| !name.is_empty() && name != "none")
    };

    Some(MediaStream {
        format_id: format.format_id.clone().unwrap_or_default(),
        container: format
            .ext
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase(),
        progressive: has_codec(&format.acodec) && has_codec(&format.vcodec),
        url,
        byte_length: format
            .filesize
            .map(|size| size as f64)
            .filter(|size| *size > 0.0)
            .map(|size| size as u64),
        http_headers: format
            .http_headers
            .iter()
            .flatten()
            .filter_map(|(name, value)| Some((name.clone(), value.clone()?)))
            .collect(),
    })
}
