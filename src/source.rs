//! Source adapter trait and configuration.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::session::SourceSession;
use crate::{Artifact, Result, ResultLink, SearchError, TorrentResult};

/// What a source hands back from a successful lookup.
#[derive(Debug, Default)]
pub struct Lookup {
    /// Normalized results.
    pub results: Vec<TorrentResult>,
    /// Session to reuse when one of these results is downloaded.
    pub session: Option<SourceSession>,
}

impl Lookup {
    /// A lookup without session.
    pub fn new(results: Vec<TorrentResult>) -> Self {
        Self {
            results,
            session: None,
        }
    }

    /// Attaches the session produced during lookup.
    pub fn with_session(mut self, session: SourceSession) -> Self {
        self.session = Some(session);
        self
    }
}

/// Trait for implementing torrent sources.
///
/// Each source must implement this trait to be registered and searched. A
/// source never observes another source's state; everything it needs for a
/// later download travels inside the [`TorrentResult`] and its own
/// [`SourceSession`].
#[async_trait]
pub trait Source: Send + Sync {
    /// Returns the source configuration.
    fn config(&self) -> &SourceConfig;

    /// Searches the source.
    ///
    /// The whole network and parse sequence must finish within `timeout`;
    /// exceeding it yields [`SearchError::Timeout`], never a partial list.
    async fn lookup(&self, query: &str, category: &str, timeout: Duration) -> Result<Lookup>;

    /// Turns a result from this source into a magnet or a file under `dest_dir`.
    ///
    /// The default implementation passes magnets through and refuses
    /// description pages.
    async fn resolve(
        &self,
        item: &TorrentResult,
        _session: Option<&SourceSession>,
        _dest_dir: &Path,
        _timeout: Duration,
    ) -> Result<Artifact> {
        match &item.link {
            ResultLink::Magnet(magnet) => Ok(Artifact::Magnet(magnet.clone())),
            ResultLink::Description(url) => Err(SearchError::Other(format!(
                "Source '{}' cannot resolve description page {}",
                self.shortcut(),
                url
            ))),
        }
    }

    /// Returns the source name.
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Returns the source shortcut.
    fn shortcut(&self) -> &str {
        &self.config().shortcut
    }

    /// Returns whether downloads need the session produced by lookup.
    fn requires_session(&self) -> bool {
        self.config().requires_session
    }

    /// Returns whether the source is enabled.
    fn is_enabled(&self) -> bool {
        self.config().enabled
    }
}

/// Runs `fut` under `limit`, turning expiry into [`SearchError::Timeout`].
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| SearchError::Timeout(limit))?
}
