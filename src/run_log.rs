//! Run log: an append-only text file of notable events, echoed to the console via tracing.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

/// Writes `[timestamp] message` lines to the run's log file.
///
/// The file is opened in append mode for every line, so it can be uploaded and removed
/// mid-run; a later line simply starts a fresh file. Write failures are reported through
/// tracing and otherwise ignored.
#[derive(Debug, Clone)]
pub struct RunLogger {
    path: PathBuf,
}

impl RunLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.record(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(Level::Error, message.as_ref());
    }

    fn record(&self, level: Level, message: &str) {
        match level {
            Level::Info => tracing::info!(target: "run_log", "{message}"),
            Level::Warn => tracing::warn!(target: "run_log", "{message}"),
            Level::Error => tracing::error!(target: "run_log", "{message}"),
        }
        if let Err(e) = self.append(message) {
            tracing::error!(error = ?e, path = %self.path.display(), "Failed to write run log line");
        }
    }

    fn append(&self, message: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_line(message))
    }
}

/// `[YYYY-MM-DD HH:MM:SS] message`, stamped with the current local time.
pub fn format_line(message: &str) -> String {
    format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), message)
}
