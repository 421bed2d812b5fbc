//! Video identifiers.
//!
//! A [`VideoId`] is the platform-assigned identifier of a video. It doubles
//! as the name of the per-video output directory, so construction rejects
//! anything that is not a single, plain path component.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::KeyframeError;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// An opaque, validated video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Validate and wrap a raw identifier.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`KeyframeError::InvalidVideoId`] for empty ids, `.`/`..`, or
    /// ids containing path separators or control characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, KeyframeError> {
        let trimmed = raw.as_ref().trim();
        let unusable = trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed
                .chars()
                .any(|c| c == '/' || c == '\\' || c.is_control());
        if unusable {
            return Err(KeyframeError::InvalidVideoId(raw.as_ref().to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse a composite identifier such as `youtube:dQw4w9WgXcQ`.
    ///
    /// The id is everything after the first `:`.
    ///
    /// # Example
    ///
    /// ```
    /// use keyframer::VideoId;
    ///
    /// let id = VideoId::from_composite("youtube:abc:def")?;
    /// assert_eq!(id.as_str(), "abc:def");
    /// # Ok::<(), keyframer::KeyframeError>(())
    /// ```
    pub fn from_composite(composite: &str) -> Result<Self, KeyframeError> {
        match composite.split_once(':') {
            Some((_, id)) => Self::new(id),
            None => Err(KeyframeError::InvalidVideoId(composite.to_string())),
        }
    }

    /// The bare id, as used for the output directory name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical watch page for this video.
    pub fn watch_url(&self) -> String {
        format!("{WATCH_URL_PREFIX}{}", self.0)
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
