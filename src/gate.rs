//! Idempotency gate.
//!
//! The only record of "already processed" is a non-empty output directory.
//! An empty directory (left behind by a run that died before its first
//! frame write, or by a video with no usable stream) is reused.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{error::KeyframeError, video_id::VideoId};

/// What the gate found for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The directory holds at least one entry; nothing more to do.
    AlreadyProcessed {
        /// Number of entries found.
        existing_entries: usize,
    },
    /// The directory is missing or empty and has been (re)created.
    Proceed,
}

/// Per-video output directory: `{root}/{video_id}`.
pub fn output_directory(root: &Path, video_id: &VideoId) -> PathBuf {
    root.join(video_id.as_str())
}

/// Inspect `directory` and create it when work is needed.
///
/// Creation is idempotent: an existing, empty directory is not an error.
pub fn check_and_prepare(directory: &Path) -> Result<GateDecision, KeyframeError> {
    let existing_entries = count_entries(directory)?;
    if existing_entries > 0 {
        return Ok(GateDecision::AlreadyProcessed { existing_entries });
    }

    fs::create_dir_all(directory)?;
    log::debug!("Prepared output directory {}", directory.display());
    Ok(GateDecision::Proceed)
}

fn count_entries(directory: &Path) -> Result<usize, KeyframeError> {
    match fs::read_dir(directory) {
        Ok(entries) => Ok(entries.count()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(0),
        Err(error) => Err(error.into()),
    }
}
