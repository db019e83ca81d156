//! Error types for the panel framework and the wizard built on it.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for panel and controller operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for panel and controller operations.
///
/// Geometry problems (zero-sized regions, writes past the edge) are never
/// errors; drawing primitives clip instead.
#[derive(Debug)]
pub enum Error {
    /// I/O error from terminal operations.
    Io(io::Error),
    /// Page index outside `[0, count)`.
    InvalidPage { page: usize, count: usize },
    /// A formatted string left tags open after being fully consumed.
    Format {
        unclosed: Vec<String>,
        message: String,
    },
    /// Configuration file could not be parsed or written.
    Config { path: PathBuf, reason: String },
    /// A background worker failed or could not be stopped.
    Worker { name: String, reason: String },
    /// Writing a log snapshot failed.
    Snapshot { path: PathBuf, source: io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidPage { page, count } => {
                write!(f, "invalid page {page} (page count is {count})")
            }
            Self::Format { unclosed, message } => {
                let tags: Vec<String> = unclosed.iter().map(|t| format!("'{t}'")).collect();
                write!(
                    f,
                    "unclosed formatting tag(s): {} in {message:?}",
                    tags.join(", ")
                )
            }
            Self::Config { path, reason } => {
                write!(f, "config error in {}: {reason}", path.display())
            }
            Self::Worker { name, reason } => write!(f, "worker '{name}': {reason}"),
            Self::Snapshot { path, source } => {
                write!(f, "unable to save log to {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) | Self::Snapshot { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config {
            path: PathBuf::new(),
            reason: e.message().to_string(),
        }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Self::Config {
            path: PathBuf::new(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPage { page: 4, count: 2 };
        assert!(err.to_string().contains("invalid page 4"));
        assert!(err.to_string().contains("count is 2"));

        let err = Error::Format {
            unclosed: vec!["</b>".to_string()],
            message: "<b>hi".to_string(),
        };
        assert!(err.to_string().contains("'</b>'"));

        let err = Error::Worker {
            name: "setup".to_string(),
            reason: "did not stop".to_string(),
        };
        assert_eq!(err.to_string(), "worker 'setup': did not stop");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Table>("[setup\n").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn test_snapshot_error_keeps_source() {
        let err = Error::Snapshot {
            path: PathBuf::from("/tmp/x.log"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/x.log"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
