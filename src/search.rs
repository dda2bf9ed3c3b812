//! Search orchestration.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::download::Downloader;
use crate::registry::source_id;
use crate::session::Sessions;
use crate::{
    Aggregator, Lookup, Result, SearchError, SearchQuery, SearchResults, SourceFailure,
    SourceRegistry,
};

/// Outcome of one source task, tagged by source identifier.
struct SourceOutcome {
    source: String,
    result: Result<Lookup>,
}

/// Meta search that fans a query out to every requested source.
pub struct Search {
    registry: Arc<SourceRegistry>,
    aggregator: Aggregator,
    timeout: Duration,
    grace: Duration,
}

impl Search {
    /// Creates a search over `registry` with default time bounds.
    pub fn new(registry: SourceRegistry) -> Self {
        Self::with_config(registry, &SearchConfig::default())
    }

    /// Creates a search over `registry` with the bounds from `config`.
    pub fn with_config(registry: SourceRegistry, config: &SearchConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            aggregator: Aggregator::new(),
            timeout: config.timeout(),
            grace: config.grace(),
        }
    }

    /// Sets the per-source lookup bound.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Sets how long past the lookup bound a source task may run before it
    /// is abandoned.
    pub fn set_grace(&mut self, grace: Duration) {
        self.grace = grace;
    }

    /// Returns the per-source lookup bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the source registry.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Returns the number of registered sources.
    pub fn source_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns a dispatcher routing downloads to the same sources.
    pub fn downloader(&self) -> Downloader {
        Downloader::new(Arc::clone(&self.registry))
    }

    /// Searches every requested source concurrently.
    ///
    /// Input is validated before any source is contacted. Each source runs
    /// on its own task under the same time bound; a slow or failing source
    /// never blocks or corrupts the others. Failures are recorded in
    /// [`SearchResults::failures`] and the call itself fails only when every
    /// requested source failed.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResults> {
        let terms = query.terms()?.to_string();
        let ids = self.registry.resolve(&query.sources)?;

        let start = Instant::now();
        let category = query.category().to_string();
        let lookup_timeout = self.timeout;
        let deadline = self.timeout.saturating_add(self.grace);

        debug!("Searching {} sources for '{}'", ids.len(), terms);

        let tasks: Vec<_> = ids
            .iter()
            .map(|id| {
                let source = self.registry.get(id);
                let id = id.clone();
                let terms = terms.clone();
                let category = category.clone();

                async move {
                    let Some(source) = source else {
                        return SourceOutcome {
                            result: Err(SearchError::UnknownSource(id.clone())),
                            source: id,
                        };
                    };
                    debug!(source = %id, "starting lookup");
                    let handle = tokio::spawn(async move {
                        source.lookup(&terms, &category, lookup_timeout).await
                    });
                    SourceOutcome {
                        result: join_source(handle, deadline).await,
                        source: id,
                    }
                }
            })
            .collect();

        let outcomes = join_all(tasks).await;

        let mut found = Vec::new();
        let mut sessions = Sessions::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome.result {
                Ok(lookup) => {
                    debug!(
                        source = %outcome.source,
                        count = lookup.results.len(),
                        "source returned results"
                    );
                    let items = lookup
                        .results
                        .into_iter()
                        .filter(|item| source_id(&item.source) == outcome.source)
                        .collect();
                    found.push(items);
                    if let Some(session) = lookup.session {
                        if source_id(session.source()) == outcome.source {
                            sessions.insert(session);
                        } else {
                            warn!(
                                source = %outcome.source,
                                session_source = %session.source(),
                                "discarding session tagged with another source"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(source = %outcome.source, error = %e, "source lookup failed");
                    failures.push(SourceFailure::new(outcome.source, &e));
                }
            }
        }

        if found.is_empty() {
            warn!("All {} sources failed", failures.len());
            return Err(SearchError::AllSourcesFailed(failures));
        }

        let merged = self.aggregator.merge(found);
        let mut search_results = SearchResults::from_parts(merged, sessions, failures);
        search_results.set_duration(start.elapsed().as_millis() as u64);

        Ok(search_results)
    }
}

/// Waits for a source task, abandoning it once `deadline` has passed.
async fn join_source(mut handle: JoinHandle<Result<Lookup>>, deadline: Duration) -> Result<Lookup> {
    match timeout(deadline, &mut handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(SearchError::Other(format!("Source task failed: {}", e))),
        Err(_) => {
            handle.abort();
            Err(SearchError::Timeout(deadline))
        }
    }
}
