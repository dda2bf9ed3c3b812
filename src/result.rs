//! Search result types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::session::{Sessions, SourceSession};
use crate::SourceFailure;

/// Size reported by sources that do not expose one.
pub const UNKNOWN_SIZE: &str = "Unknown";

/// Seeder/leecher count reported by sources that do not expose one.
pub const UNREPORTED: i64 = -1;

/// How a result is turned into a downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "url")]
pub enum ResultLink {
    /// Magnet URI, usable as is.
    Magnet(String),
    /// Description page that must be fetched to find the magnet or file.
    Description(String),
}

impl ResultLink {
    /// Returns the magnet URI if the source exposed one directly.
    pub fn magnet(&self) -> Option<&str> {
        match self {
            Self::Magnet(m) => Some(m),
            Self::Description(_) => None,
        }
    }

    /// Returns the description page URL, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Magnet(_) => None,
            Self::Description(d) => Some(d),
        }
    }
}

/// A single torrent found by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentResult {
    /// Identifier of the source that returned this result.
    pub source: String,
    /// Display name.
    pub name: String,
    /// Free-form size, or [`UNKNOWN_SIZE`].
    pub size: String,
    /// Seeder count, or [`UNREPORTED`].
    pub seeders: i64,
    /// Leecher count, or [`UNREPORTED`].
    pub leechers: i64,
    /// Upload date in the source's own format.
    pub upload_date: Option<String>,
    /// Resolution metadata.
    pub link: ResultLink,
    /// Local path of the downloaded torrent file, once resolved.
    pub file_path: Option<PathBuf>,
}

impl TorrentResult {
    /// Creates a result with unknown size and unreported counts.
    pub fn new(source: impl Into<String>, name: impl Into<String>, link: ResultLink) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            size: UNKNOWN_SIZE.to_string(),
            seeders: UNREPORTED,
            leechers: UNREPORTED,
            upload_date: None,
            link,
            file_path: None,
        }
    }

    /// Sets the size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Sets seeder and leecher counts.
    pub fn with_peers(mut self, seeders: i64, leechers: i64) -> Self {
        self.seeders = seeders;
        self.leechers = leechers;
        self
    }

    /// Sets the upload date.
    pub fn with_upload_date(mut self, date: impl Into<String>) -> Self {
        self.upload_date = Some(date.into());
        self
    }

    /// Whether the source reported a seeder count.
    pub fn has_seeders(&self) -> bool {
        self.seeders >= 0
    }

    /// Records the artifact produced by a download.
    pub fn attach(&mut self, artifact: &Artifact) {
        if let Artifact::File(path) = artifact {
            self.file_path = Some(path.clone());
        }
    }
}

/// Outcome of resolving a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Artifact {
    /// Magnet URI; nothing was written to disk.
    Magnet(String),
    /// Torrent file saved locally.
    File(PathBuf),
}

impl Artifact {
    /// Returns the magnet URI, if that is what was produced.
    pub fn magnet(&self) -> Option<&str> {
        match self {
            Self::Magnet(m) => Some(m),
            Self::File(_) => None,
        }
    }

    /// Returns the local path, if a file was written.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Magnet(_) => None,
            Self::File(p) => Some(p),
        }
    }
}

/// Container for the merged output of a search.
#[derive(Debug, Default)]
pub struct SearchResults {
    results: Vec<TorrentResult>,
    failures: Vec<SourceFailure>,
    sessions: Sessions,
    /// Number of results.
    pub count: usize,
    /// Search duration in milliseconds.
    pub duration_ms: u64,
}

impl SearchResults {
    /// Creates a container from already ordered results.
    pub fn new(results: Vec<TorrentResult>) -> Self {
        Self {
            count: results.len(),
            results,
            ..Default::default()
        }
    }

    /// Assembles a container from ordered results, retained sessions and
    /// per-source failures.
    pub fn from_parts(
        results: Vec<TorrentResult>,
        sessions: Sessions,
        failures: Vec<SourceFailure>,
    ) -> Self {
        Self {
            count: results.len(),
            results,
            failures,
            sessions,
            duration_ms: 0,
        }
    }

    /// Returns the results.
    pub fn items(&self) -> &[TorrentResult] {
        &self.results
    }

    /// Returns the result at `index`.
    pub fn get(&self, index: usize) -> Option<&TorrentResult> {
        self.results.get(index)
    }

    /// Records a source failure.
    pub fn add_failure(&mut self, failure: SourceFailure) {
        self.failures.push(failure);
    }

    /// Sources that failed, with their errors.
    pub fn failures(&self) -> &[SourceFailure] {
        &self.failures
    }

    /// Retains a session produced by a source.
    pub fn add_session(&mut self, session: SourceSession) {
        self.sessions.insert(session);
    }

    /// Sessions retained for later downloads.
    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Sets the search duration.
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Splits into results, sessions and failures.
    pub fn into_parts(self) -> (Vec<TorrentResult>, Sessions, Vec<SourceFailure>) {
        (self.results, self.sessions, self.failures)
    }
}
