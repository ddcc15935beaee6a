// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeakError {
    #[error("could not find {construct} at line {line}, column {column}")]
    PositionMiss {
        construct: &'static str,
        line: usize,
        column: usize,
    },

    #[error("could not analyze pattern: {0}")]
    PatternMismatch(String),

    #[error("no containing function found")]
    MissingContext,

    #[error("unsupported leak type: {0}")]
    UnsupportedLeakType(String),

    #[error("failed to parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LeakError>;

impl LeakError {
    pub(crate) fn mismatch(detail: impl Into<String>) -> Self {
        Self::PatternMismatch(detail.into())
    }

    /// True for failures caused by the requested position rather than the code there.
    #[must_use]
    pub fn is_position_miss(&self) -> bool {
        matches!(self, Self::PositionMiss { .. })
    }
}

// Allow `?` on std::io::Error by converting to LeakError::Io with unknown path.
impl From<std::io::Error> for LeakError {
    fn from(source: std::io::Error) -> Self {
        LeakError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}

impl From<toml::de::Error> for LeakError {
    fn from(e: toml::de::Error) -> Self {
        LeakError::Config(e.to_string())
    }
}

// Gracefully convert WalkDir errors
impl From<walkdir::Error> for LeakError {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map_or_else(|| PathBuf::from("<unknown>"), PathBuf::from);
        match e.into_io_error() {
            Some(source) => LeakError::Io { source, path },
            None => LeakError::Io {
                source: std::io::Error::other("filesystem loop"),
                path,
            },
        }
    }
}
