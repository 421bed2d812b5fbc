//! FFmpeg console verbosity.
//!
//! FFmpeg prints its own warnings to stderr independently of the `log`
//! facade; a batch over hundreds of videos is far more readable with that
//! turned down. [`set_ffmpeg_log_level`] adjusts it; the CLI exposes it as
//! `--ffmpeg-log-level`.

use std::str::FromStr;

use ffmpeg_next::util::log::Level;

/// FFmpeg's `AV_LOG_*` levels, quietest first.
///
/// Each level includes every message of the levels above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only conditions after which the process will abort.
    Panic,
    /// Unrecoverable errors that end the current operation.
    Fatal,
    /// Recoverable errors, e.g. a corrupt packet. The default.
    #[default]
    Error,
    /// Suspicious input that may produce wrong output.
    Warning,
    /// Informational messages such as stream summaries.
    Info,
    /// Detailed informational messages.
    Verbose,
    /// Developer diagnostics.
    Debug,
    /// Extremely verbose per-packet tracing.
    Trace,
}

impl From<FfmpegLogLevel> for Level {
    fn from(level: FfmpegLogLevel) -> Self {
        match level {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(format!("unknown FFmpeg log level: {other}")),
        }
    }
}

/// Set FFmpeg's own stderr verbosity. Does not touch `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.into());
}
