//! Error types for adrman.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level result type for repository operations.
pub type Result<T> = std::result::Result<T, AdrError>;

/// A record did not follow the heading / status-section convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed heading: expected '<number>.' as first token, found '{token}'")]
    MalformedHeading { token: String },

    #[error("no heading found before end of document")]
    NoHeadingFound,

    #[error("section '{name}' not found")]
    SectionNotFound { name: String },
}

/// Top-level error type for adrman.
#[derive(Debug, Error)]
pub enum AdrError {
    #[error("no decision record repository here: {} does not exist (run 'adrman init')", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("repository already initialized: {} exists", path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("invalid configuration in {}: {source}", path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in {}: {reason}", path.display())]
    InvalidConfigValue { path: PathBuf, reason: String },

    #[error("{}: {kind}", path.display())]
    Parse { path: PathBuf, kind: ParseError },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no decision record with index {0}")]
    IndexNotFound(u32),

    #[error("'{0}' is not a valid record index")]
    InvalidIndex(String),

    #[error("invalid status {0:?}: must be a single non-empty line")]
    InvalidStatus(String),

    #[error("invalid search keyword '{keyword}': {source}")]
    InvalidKeyword {
        keyword: String,
        #[source]
        source: regex::Error,
    },

    #[error("export format '{0}' is not supported (use csv, json or html)")]
    UnsupportedFormat(String),
}

impl AdrError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        AdrError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: impl AsRef<Path>, kind: ParseError) -> Self {
        AdrError::Parse {
            path: path.as_ref().to_path_buf(),
            kind,
        }
    }
}
