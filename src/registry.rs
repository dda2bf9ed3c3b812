//! Registry of known sources keyed by identifier.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::{Credentials, SearchConfig};
use crate::query::ALL_SOURCES;
use crate::sources::{Archive, Otts, PirateBay, Ygg};
use crate::{Result, SearchError, Source};

/// Canonical form of a source identifier: trimmed and lowercased.
pub(crate) fn source_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Fixed set of sources a search may be fanned out to.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the four built-in sources.
    ///
    /// `credentials` are used by the login-gated source; without them it
    /// still searches, but downloads will fail with an auth error.
    pub fn with_defaults(config: &SearchConfig, credentials: Option<Credentials>) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Archive::new(config)?);
        registry.register(PirateBay::new(config)?);
        registry.register(Otts::new(config)?);
        registry.register(Ygg::new(config, credentials));
        Ok(registry)
    }

    /// Registers a source under its shortcut, replacing any previous one.
    pub fn register<S: Source + 'static>(&mut self, source: S) {
        self.register_arc(Arc::new(source));
    }

    /// Registers an already shared source under its canonical shortcut.
    pub fn register_arc(&mut self, source: Arc<dyn Source>) {
        let id = source_id(source.shortcut());
        debug!(source = %id, "registered source");
        self.sources.insert(id, source);
    }

    /// Returns the source registered under `id`.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Source>> {
        self.sources.get(&source_id(id)).cloned()
    }

    /// Identifiers of every enabled source, in sorted order.
    pub fn known(&self) -> Vec<String> {
        self.sources
            .iter()
            .filter(|(_, source)| source.is_enabled())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Iterates over every registered source.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Validates and deduplicates requested source identifiers.
    ///
    /// [`ALL_SOURCES`] anywhere in the request expands to every known source
    /// and the other entries are ignored. Otherwise each identifier must be
    /// known, or the whole request fails with [`SearchError::UnknownSource`].
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<Vec<String>> {
        let requested: BTreeSet<String> = requested
            .iter()
            .map(|s| source_id(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();

        if requested.contains(ALL_SOURCES) {
            let known = self.known();
            if known.is_empty() {
                return Err(SearchError::NoSources);
            }
            return Ok(known);
        }

        if requested.is_empty() {
            return Err(SearchError::NoSources);
        }

        for id in &requested {
            let enabled = self.sources.get(id).is_some_and(|s| s.is_enabled());
            if !enabled {
                return Err(SearchError::UnknownSource(id.clone()));
            }
        }

        Ok(requested.into_iter().collect())
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}
