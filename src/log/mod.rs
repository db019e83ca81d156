//! User-facing event log: levels, entries and the log panel.
//!
//! This is the log the user reads inside the UI. Diagnostics about the
//! framework itself go through `tracing` to a file instead.
//!
//! Worker threads never call into [`LogPanel`] directly. They log through a
//! [`LogSender`], which queues entries on the panel's Async Bridge and wakes
//! its redraw thread.
//!
//! # Examples
//!
//! ```
//! use setup_tui::log::LogLevel;
//!
//! let level: LogLevel = "info".parse().unwrap();
//! assert_eq!(level, LogLevel::Info);
//! assert!(level.includes(LogLevel::Error));
//! assert!(!level.includes(LogLevel::Debug));
//! ```

mod panel;
mod worker;

pub use panel::{CONTENT_HEIGHT_REDRAW_THRESHOLD, ENTRY_INDENT, LogPanel};

use crate::bridge::BridgeSender;
use crate::color::Color;
use crate::error::{Error, Result};
use crate::text::printable;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use worker::RedrawSignal;

/// Severity of a log entry. Lower index means more severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl LogLevel {
    /// Every level, most severe first.
    pub const ALL: [Self; 3] = [Self::Error, Self::Info, Self::Debug];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Error => 0,
            Self::Info => 1,
            Self::Debug => 2,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Key that selects this level in the level popup.
    #[must_use]
    pub const fn shortcut(self) -> char {
        match self {
            Self::Error => 'e',
            Self::Info => 'i',
            Self::Debug => 'd',
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Error => "displays only error messages",
            Self::Info => "displays error and information messages (recommended)",
            Self::Debug => "displays all messages (most verbose)",
        }
    }

    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Error => Color::Red,
            Self::Info => Color::Green,
            Self::Debug => Color::Yellow,
        }
    }

    /// Level for a shortcut key, either case.
    #[must_use]
    pub fn from_shortcut(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        Self::ALL.into_iter().find(|level| level.shortcut() == key)
    }

    /// Whether a threshold of `self` shows entries of `level`.
    #[must_use]
    pub const fn includes(self, level: Self) -> bool {
        level.index() <= self.index()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A severity string that names no level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level '{}'", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

/// One logged event.
#[derive(Clone, Debug)]
pub struct LogEntry {
    timestamp: DateTime<Local>,
    level: LogLevel,
    message: String,
    display: OnceLock<String>,
}

impl LogEntry {
    /// Entry stamped now. Control characters are stripped from `message`.
    #[must_use]
    pub fn new(level: LogLevel, message: &str) -> Self {
        Self::at(Local::now(), level, message)
    }

    #[must_use]
    pub fn at(timestamp: DateTime<Local>, level: LogLevel, message: &str) -> Self {
        Self {
            timestamp,
            level,
            message: printable(message),
            display: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// `HH:MM:SS [LEVEL] message`, computed once.
    #[must_use]
    pub fn display(&self) -> &str {
        self.display.get_or_init(|| {
            format!("{} [{}] {}", self.timestamp.format("%H:%M:%S"), self.level, self.message)
        })
    }

    /// `M/D/YYYY HH:MM:SS [LEVEL] message`, as written to snapshots.
    #[must_use]
    pub fn dated_display(&self) -> String {
        format!(
            "{} [{}] {}",
            self.timestamp.format("%-m/%-d/%Y %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Thread-safe handle for logging into a [`LogPanel`].
#[derive(Clone, Debug)]
pub struct LogSender {
    tx: BridgeSender<LogEntry>,
    signal: Arc<RedrawSignal>,
}

impl LogSender {
    pub(crate) fn new(tx: BridgeSender<LogEntry>, signal: Arc<RedrawSignal>) -> Self {
        Self { tx, signal }
    }

    /// Queue a message. Never blocks.
    pub fn log(&self, level: LogLevel, message: &str) {
        if self.tx.put(LogEntry::new(level, message)) {
            self.signal.wake();
        }
    }

    /// Queue a message with a severity given by name. Unknown severities
    /// are dropped; returns whether the message was queued.
    pub fn log_str(&self, severity: &str, message: &str) -> bool {
        match severity.parse() {
            Ok(level) => {
                self.log(level, message);
                true
            }
            Err(_) => false,
        }
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }
}

/// Write `lines` to `path`, creating missing parent directories and
/// replacing any existing file.
///
/// # Errors
///
/// [`Error::Snapshot`] naming the path on any I/O failure.
pub fn write_snapshot<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let snapshot_error = |source| Error::Snapshot {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(snapshot_error)?;
    }
    let file = fs::File::create(path).map_err(snapshot_error)?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{}", line.as_ref()).map_err(snapshot_error)?;
    }
    out.flush().map_err(snapshot_error)?;
    tracing::info!(path = %path.display(), "saved snapshot");
    Ok(())
}
