use std::{
    fmt::Display,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::warn;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

impl Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
        })
    }
}

/**
 * Human readable audit trail of what happened at the counter, one line per
 * event, appended to a plain text file.
 *
 * Writing is best effort: a log that cannot be opened or written is
 * reported on the diagnostics channel and otherwise ignored, the banking
 * operation that triggered it has already happened.
 */
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ActivityLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, message: impl Display) {
        self.record(Level::Info, message)
    }

    pub fn warning(&self, message: impl Display) {
        self.record(Level::Warning, message)
    }

    pub fn record(&self, level: Level, message: impl Display) {
        let line = format!(
            "{} - {} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level,
            message
        );

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "could not write activity log");
        }
    }
}
