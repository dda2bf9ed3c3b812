//! The Pirate Bay source, through the apibay JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{format_timestamp, parse_count};
use crate::config::{SearchConfig, SourceConfig};
use crate::http::{build_client, fetch};
use crate::source::bounded;
use crate::{Lookup, Result, ResultLink, SearchError, Source, TorrentResult};

const DEFAULT_BASE_URL: &str = "https://apibay.org";

/// Trackers appended to every generated magnet.
const TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.stealth.si:80/announce",
    "udp://tracker.torrent.eu.org:451/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://exodus.desync.com:6969/announce",
];

/// Hash apibay returns in its "No results returned" placeholder row.
const EMPTY_HASH: &str = "0000000000000000000000000000000000000000";

/// The Pirate Bay source.
pub struct PirateBay {
    config: SourceConfig,
    client: Client,
    base_url: String,
}

impl PirateBay {
    /// Creates a new Pirate Bay source.
    pub fn new(search: &SearchConfig) -> Result<Self> {
        Ok(Self {
            config: SourceConfig {
                name: "The Pirate Bay".to_string(),
                shortcut: "tpb".to_string(),
                requires_session: false,
                enabled: true,
            },
            client: build_client(search, false)?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the source at another apibay mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, query: &str, category: &str) -> String {
        format!(
            "{}/q.php?q={}&cat={}",
            self.base_url,
            urlencoding::encode(query),
            category_code(category)
        )
    }

    fn parse_results(&self, json: &str) -> Result<Vec<TorrentResult>> {
        let rows: Vec<ApiTorrent> = serde_json::from_str(json)
            .map_err(|e| SearchError::Parse(format!("Unexpected apibay response: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter(|row| row.id != "0" && row.info_hash != EMPTY_HASH)
            .map(|row| {
                let mut result = TorrentResult::new(
                    self.shortcut(),
                    row.name.clone(),
                    ResultLink::Magnet(magnet(&row.info_hash, &row.name)),
                )
                .with_size(
                    row.size
                        .parse::<u64>()
                        .map(human_size)
                        .unwrap_or_else(|_| row.size.clone()),
                )
                .with_peers(parse_count(&row.seeders), parse_count(&row.leechers));
                if let Some(date) = row.added.parse::<i64>().ok().and_then(format_timestamp) {
                    result = result.with_upload_date(date);
                }
                result
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ApiTorrent {
    id: String,
    name: String,
    info_hash: String,
    #[serde(default)]
    seeders: String,
    #[serde(default)]
    leechers: String,
    #[serde(default)]
    size: String,
    #[serde(default)]
    added: String,
}

#[async_trait]
impl Source for PirateBay {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn lookup(&self, query: &str, category: &str, timeout: Duration) -> Result<Lookup> {
        let url = self.search_url(query, category);
        bounded(timeout, async {
            let json = fetch(&self.client, &url).await?;
            Ok(Lookup::new(self.parse_results(&json)?))
        })
        .await
    }
}

/// apibay top-level category code; 0 searches everything.
fn category_code(category: &str) -> u32 {
    match category.trim().to_lowercase().as_str() {
        "audio" | "music" => 100,
        "video" | "movies" => 200,
        "tv" => 205,
        "applications" | "apps" | "software" => 300,
        "games" => 400,
        "porn" | "xxx" => 500,
        "other" | "books" | "ebooks" => 600,
        _ => 0,
    }
}

fn magnet(info_hash: &str, name: &str) -> String {
    let mut magnet = format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash.to_uppercase(),
        urlencoding::encode(name)
    );
    for tracker in TRACKERS {
        magnet.push_str("&tr=");
        magnet.push_str(&urlencoding::encode(tracker));
    }
    magnet
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
