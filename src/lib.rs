//! # torrent-search
//!
//! Concurrent torrent search across several independent sources.
//!
//! A query is fanned out to every requested source in parallel, each under
//! the same time bound. Results are merged and ranked by seeders; a source
//! that fails or hangs is recorded as a diagnostic and never prevents the
//! others from answering. A chosen result is later resolved into a magnet
//! or a torrent file by the source it came from, reusing the session that
//! source produced during the search.
//!
//! ## Example
//!
//! ```rust,no_run
//! use torrent_search::{Search, SearchConfig, SearchQuery, SourceRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SearchConfig::default();
//!     let registry = SourceRegistry::with_defaults(&config, None)?;
//!     let search = Search::with_config(registry, &config);
//!
//!     let query = SearchQuery::new("ubuntu 24.04").with_sources(["tpb", "arc"]);
//!     let results = search.search(query).await?;
//!
//!     for result in results.items() {
//!         println!("{} [{}] {} seeders", result.name, result.source, result.seeders);
//!     }
//!
//!     if let Some(first) = results.get(0) {
//!         let artifact = search
//!             .downloader()
//!             .download(first, results.sessions(), &config.download_dir, search.timeout())
//!             .await?;
//!         println!("{:?}", artifact);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregator;
mod config;
mod download;
mod error;
mod query;
mod registry;
mod result;
mod search;
mod session;
mod source;

pub mod http;
pub mod sources;

pub use aggregator::Aggregator;
pub use config::{Credentials, SearchConfig, SourceConfig, DEFAULT_USER_AGENT, MAX_TIMEOUT_SECS};
pub use download::Downloader;
pub use error::{ErrorKind, Result, SearchError, SourceFailure};
pub use query::{SearchQuery, ALL_SOURCES};
pub use registry::SourceRegistry;
pub use result::{Artifact, ResultLink, SearchResults, TorrentResult, UNKNOWN_SIZE, UNREPORTED};
pub use search::Search;
pub use session::{SessionId, Sessions, SourceSession};
pub use source::{bounded, Lookup, Source};
