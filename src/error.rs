//! Error types for the search library.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Coarse classification of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad query, unknown source or invalid configuration. Nothing was started.
    Input,
    /// Transport or network failure reaching a source.
    Fetch,
    /// The page did not have the expected structure.
    Parse,
    /// Credentials were missing or rejected.
    Auth,
    /// The source did not answer within its time bound.
    Timeout,
    /// Every requested source failed.
    AllSourcesFailed,
    /// Local filesystem failure while saving an artifact.
    Io,
    /// Anything else, including a source task that panicked.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Auth => "auth",
            Self::Timeout => "timeout",
            Self::AllSourcesFailed => "all sources failed",
            Self::Io => "io",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Diagnostic record of one source that failed during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Source identifier.
    pub source: String,
    /// Classification of the failure.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl SourceFailure {
    /// Records the failure of `source` with `error`.
    pub fn new(source: impl Into<String>, error: &SearchError) -> Self {
        Self {
            source: source.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

/// Errors that can occur during search and download operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Source identifier not known to the registry.
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    /// No sources were requested.
    #[error("No sources requested")]
    NoSources,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source answered with a non-success status.
    #[error("Request to {url} failed with status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed or credentials are missing.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Operation exceeded its time bound.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Every requested source failed.
    #[error("All sources failed: {}", join_failures(.0))]
    AllSourcesFailed(Vec<SourceFailure>),

    /// The source needs the session produced during search, and none was retained.
    #[error("No session retained for source '{0}'")]
    MissingSession(String),

    /// Filesystem error while saving an artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery(_) | Self::UnknownSource(_) | Self::NoSources | Self::Config(_) => {
                ErrorKind::Input
            }
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Http(_) | Self::Status { .. } | Self::UrlParse(_) => ErrorKind::Fetch,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Auth(_) | Self::MissingSession(_) => ErrorKind::Auth,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::AllSourcesFailed(_) => ErrorKind::AllSourcesFailed,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Internal,
        }
    }
}

fn join_failures(failures: &[SourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
