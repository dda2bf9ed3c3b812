//! End-to-end behavior of the search orchestrator and download dispatcher,
//! driven by in-process spy sources.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use torrent_search::{
    Artifact, ErrorKind, Lookup, Result, ResultLink, Search, SearchError, SearchQuery,
    SessionId, Source, SourceConfig, SourceRegistry, SourceSession, TorrentResult,
};

/// Source that records every call and answers with a fixed list after a delay.
struct SpySource {
    config: SourceConfig,
    seeders: Vec<i64>,
    delay: Duration,
    fail: bool,
    with_session: bool,
    lookups: Arc<AtomicUsize>,
    resolves: Arc<AtomicUsize>,
    issued: Arc<Mutex<Option<SessionId>>>,
    received: Arc<Mutex<Vec<SessionId>>>,
}

impl SpySource {
    fn new(shortcut: &str, seeders: Vec<i64>) -> Self {
        Self {
            config: SourceConfig {
                name: shortcut.to_uppercase(),
                shortcut: shortcut.to_string(),
                ..Default::default()
            },
            seeders,
            delay: Duration::ZERO,
            fail: false,
            with_session: false,
            lookups: Arc::new(AtomicUsize::new(0)),
            resolves: Arc::new(AtomicUsize::new(0)),
            issued: Arc::new(Mutex::new(None)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn authenticated(mut self) -> Self {
        self.with_session = true;
        self.config.requires_session = true;
        self
    }
}

#[async_trait]
impl Source for SpySource {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn lookup(&self, query: &str, _category: &str, _timeout: Duration) -> Result<Lookup> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        // Ignores its own bound so the orchestrator deadline is what stops it.
        tokio::time::sleep(self.delay).await;

        if self.fail {
            return Err(SearchError::Parse(format!("{} page changed", self.shortcut())));
        }

        let results = self
            .seeders
            .iter()
            .enumerate()
            .map(|(i, &seeders)| {
                TorrentResult::new(
                    self.shortcut(),
                    format!("{} {}-{}", query, self.shortcut(), i),
                    ResultLink::Description(format!("https://{}/t/{}", self.shortcut(), i)),
                )
                .with_peers(seeders, 0)
            })
            .collect();

        let mut lookup = Lookup::new(results);
        if self.with_session {
            let session = SourceSession::new(self.shortcut(), reqwest::Client::new()).authenticated();
            *self.issued.lock().unwrap() = Some(session.id());
            lookup = lookup.with_session(session);
        }
        Ok(lookup)
    }

    async fn resolve(
        &self,
        item: &TorrentResult,
        session: Option<&SourceSession>,
        _dest_dir: &Path,
        _timeout: Duration,
    ) -> Result<Artifact> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if let Some(session) = session {
            self.received.lock().unwrap().push(session.id());
        }
        Ok(Artifact::Magnet(format!("magnet:?dn={}", item.name)))
    }
}

struct Spies {
    lookups: Arc<AtomicUsize>,
    resolves: Arc<AtomicUsize>,
    issued: Arc<Mutex<Option<SessionId>>>,
    received: Arc<Mutex<Vec<SessionId>>>,
}

fn spies(source: &SpySource) -> Spies {
    Spies {
        lookups: Arc::clone(&source.lookups),
        resolves: Arc::clone(&source.resolves),
        issued: Arc::clone(&source.issued),
        received: Arc::clone(&source.received),
    }
}

fn search_over(sources: Vec<SpySource>) -> Search {
    let mut registry = SourceRegistry::new();
    for source in sources {
        registry.register(source);
    }
    Search::new(registry)
}

#[tokio::test]
async fn test_results_are_union_of_succeeding_sources() {
    let search = search_over(vec![
        SpySource::new("a", vec![10, 20]),
        SpySource::new("b", vec![5]),
        SpySource::new("c", vec![1]).failing(),
    ]);

    let results = search
        .search(SearchQuery::new("linux").with_sources(["a", "b", "c"]))
        .await
        .unwrap();

    let mut names: Vec<_> = results.items().iter().map(|r| r.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["linux a-0", "linux a-1", "linux b-0"]);
    assert!(results.items().iter().all(|r| r.source != "c"));
    assert_eq!(results.failures().len(), 1);
    assert_eq!(results.failures()[0].source, "c");
}

#[tokio::test]
async fn test_unrequested_sources_are_not_contacted() {
    let a = SpySource::new("a", vec![1]);
    let b = SpySource::new("b", vec![2]);
    let (spy_a, spy_b) = (spies(&a), spies(&b));
    let search = search_over(vec![a, b]);

    let results = search
        .search(SearchQuery::new("linux").with_sources(["b"]))
        .await
        .unwrap();

    assert_eq!(results.items().len(), 1);
    assert_eq!(spy_a.lookups.load(Ordering::SeqCst), 0);
    assert_eq!(spy_b.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_all_sources_failed() {
    let search = search_over(vec![
        SpySource::new("a", vec![]).failing(),
        SpySource::new("b", vec![]).failing(),
    ]);

    let err = search
        .search(SearchQuery::new("linux"))
        .await
        .err()
        .expect("search should fail");

    assert_eq!(err.kind(), ErrorKind::AllSourcesFailed);
    let SearchError::AllSourcesFailed(failures) = err else {
        unreachable!();
    };
    assert_eq!(failures.len(), 2);
}

#[tokio::test]
async fn test_zero_results_is_not_a_failure() {
    let search = search_over(vec![
        SpySource::new("a", vec![]),
        SpySource::new("b", vec![]).failing(),
    ]);

    let results = search.search(SearchQuery::new("linux")).await.unwrap();

    assert!(results.items().is_empty());
    assert_eq!(results.count, 0);
    assert_eq!(results.failures().len(), 1);
}

#[tokio::test]
async fn test_all_shorthand_overrides_other_identifiers() {
    let a = SpySource::new("a", vec![1]);
    let b = SpySource::new("b", vec![2]);
    let (spy_a, spy_b) = (spies(&a), spies(&b));
    let search = search_over(vec![a, b]);

    let results = search
        .search(SearchQuery::new("linux").with_sources(["a", "all", "nope"]))
        .await
        .unwrap();

    assert_eq!(results.items().len(), 2);
    assert_eq!(spy_a.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(spy_b.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_source_invokes_no_adapter() {
    let a = SpySource::new("a", vec![1]);
    let spy = spies(&a);
    let search = search_over(vec![a]);

    let err = search
        .search(SearchQuery::new("linux").with_sources(["a", "nope"]))
        .await
        .err()
        .expect("unknown source should be rejected");

    assert!(matches!(err, SearchError::UnknownSource(ref id) if id == "nope"));
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(spy.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_blank_query_invokes_no_adapter() {
    let a = SpySource::new("a", vec![1]);
    let spy = spies(&a);
    let search = search_over(vec![a]);

    for blank in ["", "   ", "\t\n"] {
        let err = search
            .search(SearchQuery::new(blank))
            .await
            .err()
            .expect("blank query should be rejected");
        assert!(matches!(err, SearchError::InvalidQuery(_)));
        assert_eq!(err.kind(), ErrorKind::Input);
    }
    assert_eq!(spy.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sorted_by_seeders_with_unreported_last() {
    let search = search_over(vec![
        SpySource::new("a", vec![3, -1, 300]),
        SpySource::new("b", vec![-1, 0, 42]),
    ]);

    let results = search.search(SearchQuery::new("linux")).await.unwrap();

    let seeders: Vec<i64> = results.items().iter().map(|r| r.seeders).collect();
    assert_eq!(seeders, vec![300, 42, 3, 0, -1, -1]);

    // Equal counts fall back to name order.
    let tail: Vec<_> = results.items()[4..].iter().map(|r| r.name.as_str()).collect();
    assert_eq!(tail, vec!["linux a-1", "linux b-0"]);
}

#[tokio::test]
async fn test_hung_source_does_not_delay_others() {
    let a = SpySource::new("a", vec![7, 8, 9]).delayed(Duration::from_millis(50));
    let b = SpySource::new("b", vec![100]).delayed(Duration::from_secs(60));
    let mut search = search_over(vec![a, b]);
    search.set_timeout(Duration::from_millis(200));
    search.set_grace(Duration::from_millis(50));

    let started = std::time::Instant::now();
    let results = search
        .search(SearchQuery::new("linux").with_sources(["a", "b"]))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(results.items().len(), 3);
    assert!(results.items().iter().all(|r| r.source == "a"));

    assert_eq!(results.failures().len(), 1);
    assert_eq!(results.failures()[0].source, "b");
    assert_eq!(results.failures()[0].kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_session_round_trip_through_downloader() {
    let ygg = SpySource::new("ygg", vec![12]).authenticated();
    let open = SpySource::new("open", vec![4]);
    let (spy_ygg, spy_open) = (spies(&ygg), spies(&open));
    let search = search_over(vec![ygg, open]);

    let results = search.search(SearchQuery::new("linux")).await.unwrap();
    let item = results.get(0).unwrap();
    assert_eq!(item.source, "ygg");

    let dir = tempfile::tempdir().unwrap();
    let artifact = search
        .downloader()
        .download(item, results.sessions(), dir.path(), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(artifact.magnet(), Some("magnet:?dn=linux ygg-0"));
    assert_eq!(spy_ygg.resolves.load(Ordering::SeqCst), 1);
    assert_eq!(spy_open.resolves.load(Ordering::SeqCst), 0);

    let issued = spy_ygg.issued.lock().unwrap().expect("session issued");
    assert_eq!(*spy_ygg.received.lock().unwrap(), vec![issued]);
    assert_eq!(results.sessions().get("ygg").map(|s| s.id()), Some(issued));
}

#[tokio::test]
async fn test_download_without_session_fails_for_gated_source() {
    let ygg = SpySource::new("ygg", vec![12]).authenticated();
    let spy = spies(&ygg);
    let search = search_over(vec![ygg]);

    let results = search.search(SearchQuery::new("linux")).await.unwrap();
    let (items, _sessions, _) = results.into_parts();

    let err = search
        .downloader()
        .download(
            &items[0],
            &Default::default(),
            Path::new("."),
            Duration::from_secs(1),
        )
        .await
        .err()
        .expect("missing session should be rejected");

    assert!(matches!(err, SearchError::MissingSession(_)));
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(spy.resolves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_searches_do_not_share_state() {
    let ygg = SpySource::new("ygg", vec![1]).authenticated();
    let search = search_over(vec![ygg]);

    let first = search.search(SearchQuery::new("first")).await.unwrap();
    let second = search.search(SearchQuery::new("second")).await.unwrap();

    assert_eq!(first.items()[0].name, "first ygg-0");
    assert_eq!(second.items()[0].name, "second ygg-0");
    assert_ne!(
        first.sessions().get("ygg").map(|s| s.id()),
        second.sessions().get("ygg").map(|s| s.id())
    );
}
