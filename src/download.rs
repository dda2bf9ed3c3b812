//! Download dispatch back to the source a result came from.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::session::Sessions;
use crate::source::bounded;
use crate::{Artifact, Result, SearchError, SourceRegistry, TorrentResult};

/// Routes a chosen result to its originating source for resolution.
///
/// The dispatcher keeps no state between calls: the caller passes the
/// result it picked and the sessions retained by the search that produced
/// it. There are no retries; a failure is reported as the source raised it.
#[derive(Debug, Clone)]
pub struct Downloader {
    registry: Arc<SourceRegistry>,
}

impl Downloader {
    /// Creates a dispatcher over `registry`.
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Resolves `item` into a magnet or a torrent file saved under `dest_dir`.
    pub async fn download(
        &self,
        item: &TorrentResult,
        sessions: &Sessions,
        dest_dir: &Path,
        timeout: Duration,
    ) -> Result<Artifact> {
        let source = self
            .registry
            .get(&item.source)
            .filter(|source| source.is_enabled())
            .ok_or_else(|| SearchError::UnknownSource(item.source.clone()))?;

        let session = if source.requires_session() {
            let session = sessions
                .get(&item.source)
                .ok_or_else(|| SearchError::MissingSession(item.source.clone()))?;
            debug!(source = %item.source, session = %session.id(), "reusing session");
            Some(session)
        } else {
            None
        };

        debug!(source = %item.source, name = %item.name, "resolving torrent");
        let artifact = bounded(timeout, source.resolve(item, session, dest_dir, timeout)).await?;

        match &artifact {
            Artifact::File(path) => debug!(path = %path.display(), "torrent file saved"),
            Artifact::Magnet(_) => debug!(source = %item.source, "magnet resolved"),
        }
        Ok(artifact)
    }

    /// Like [`download`](Self::download), and records a saved file on `item`.
    pub async fn download_into(
        &self,
        item: &mut TorrentResult,
        sessions: &Sessions,
        dest_dir: &Path,
        timeout: Duration,
    ) -> Result<Artifact> {
        let artifact = self.download(item, sessions, dest_dir, timeout).await?;
        item.attach(&artifact);
        Ok(artifact)
    }
}
