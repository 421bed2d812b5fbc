//! Append-only file logger for the `log` facade.
//!
//! Lines look like `2024-05-01 12:00:00,123 - INFO - abc: Keyframes generated successfully`.
//! The log is a diagnostic side channel; nothing in the pipeline reads it.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::error::KeyframeError;

/// Default location of the run log, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "logs/screenshot.log";

/// A [`Log`] implementation appending timestamped lines to one file.
#[derive(Debug)]
pub struct FileLogger {
    file: Mutex<File>,
    path: PathBuf,
    level: LevelFilter,
    echo_to_stderr: bool,
}

impl FileLogger {
    /// Open (or create) `path` for appending; parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P, level: LevelFilter) -> Result<Self, KeyframeError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file: Mutex::new(file),
            path,
            level,
            echo_to_stderr: false,
        })
    }

    /// Also print every line to stderr.
    pub fn with_stderr_echo(mut self, echo: bool) -> Self {
        self.echo_to_stderr = echo;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Install as the process-wide logger. Can only succeed once.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_logger(Box::leak(Box::new(self)))?;
        log::set_max_level(level);
        Ok(())
    }
}

/// Render one log line (without trailing newline).
pub fn format_line(timestamp: DateTime<Local>, level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}",
        timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
        level,
        message
    )
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(Local::now(), record.level(), &record.args().to_string());
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
        if self.echo_to_stderr {
            eprintln!("{line}");
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn line_format_is_timestamp_level_message() {
        let timestamp = Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 5).unwrap();
        let line = format_line(timestamp, Level::Info, "abc: Keyframes generated successfully");
        assert_eq!(
            line,
            "2024-05-01 12:30:05,000 - INFO - abc: Keyframes generated successfully"
        );
    }

    #[test]
    fn records_are_appended() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("logs").join("screenshot.log");

        let logger = FileLogger::open(&path, LevelFilter::Info).unwrap();
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .args(format_args!("abc: No suitable stream found"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("filtered out"))
                .build(),
        );
        logger.flush();

        let reopened = FileLogger::open(&path, LevelFilter::Info).unwrap();
        reopened.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("second run"))
                .build(),
        );
        reopened.flush();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - ERROR - abc: No suitable stream found"));
        assert!(lines[1].ends_with(" - INFO - second run"));
    }
}
