//! Internet Archive source.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;

use super::{selector, text_of};
use crate::config::{SearchConfig, SourceConfig};
use crate::http::{build_client, download_file, fetch};
use crate::session::SourceSession;
use crate::source::bounded;
use crate::{Artifact, Lookup, Result, ResultLink, SearchError, Source, TorrentResult};

const BASE_URL: &str = "https://archive.org";
const MAX_ROWS: u32 = 50;

/// Internet Archive source.
///
/// The archive does not report peers, so every result carries an unknown
/// size and unreported counts. Results point at the item's description page;
/// resolving one downloads the item's torrent file.
pub struct Archive {
    config: SourceConfig,
    client: Client,
}

impl Archive {
    /// Creates a new Internet Archive source.
    pub fn new(search: &SearchConfig) -> Result<Self> {
        Ok(Self {
            config: SourceConfig {
                name: "Archive".to_string(),
                shortcut: "arc".to_string(),
                requires_session: false,
                enabled: true,
            },
            client: build_client(search, false)?,
        })
    }

    fn search_url(query: &str, category: &str) -> String {
        let mut q = format!("({})", query);
        if let Some(mediatype) = mediatype(category) {
            q.push_str(&format!(" AND mediatype:({})", mediatype));
        }
        format!(
            "{}/advancedsearch.php?q={}&fl%5B%5D=identifier&fl%5B%5D=title&rows={}&page=1&output=json",
            BASE_URL,
            urlencoding::encode(&q),
            MAX_ROWS
        )
    }

    fn parse_results(&self, json: &str) -> Result<Vec<TorrentResult>> {
        let body: AdvancedSearch = serde_json::from_str(json)
            .map_err(|e| SearchError::Parse(format!("Unexpected archive response: {}", e)))?;

        Ok(body
            .response
            .docs
            .into_iter()
            .filter(|doc| !doc.identifier.is_empty())
            .map(|doc| {
                let name = doc.title.unwrap_or_else(|| doc.identifier.clone());
                TorrentResult::new(
                    self.shortcut(),
                    name,
                    ResultLink::Description(format!("{}/details/{}", BASE_URL, doc.identifier)),
                )
            })
            .collect())
    }

    /// Finds the torrent file link on an item's description page.
    fn parse_description(html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let format_selector = selector(".format-summary")?;

        document
            .select(&format_selector)
            .find(|e| text_of(*e).contains("TORRENT"))
            .and_then(|e| e.value().attr("href"))
            .map(absolute)
            .ok_or_else(|| {
                SearchError::Parse("No torrent file on the description page".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
struct AdvancedSearch {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<Doc>,
}

#[derive(Debug, Deserialize)]
struct Doc {
    identifier: String,
    #[serde(default)]
    title: Option<String>,
}

#[async_trait]
impl Source for Archive {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn lookup(&self, query: &str, category: &str, timeout: Duration) -> Result<Lookup> {
        let url = Self::search_url(query, category);
        bounded(timeout, async {
            let json = fetch(&self.client, &url).await?;
            Ok(Lookup::new(self.parse_results(&json)?))
        })
        .await
    }

    async fn resolve(
        &self,
        item: &TorrentResult,
        _session: Option<&SourceSession>,
        dest_dir: &Path,
        timeout: Duration,
    ) -> Result<Artifact> {
        let desc_url = match &item.link {
            ResultLink::Magnet(magnet) => return Ok(Artifact::Magnet(magnet.clone())),
            ResultLink::Description(url) => url,
        };
        bounded(timeout, async {
            let html = fetch(&self.client, desc_url).await?;
            let file_url = Self::parse_description(&html)?;
            let path = download_file(&self.client, &file_url, dest_dir).await?;
            Ok(Artifact::File(path))
        })
        .await
    }
}

fn mediatype(category: &str) -> Option<&'static str> {
    match category.trim().to_lowercase().as_str() {
        "movies" | "video" | "videos" => Some("movies"),
        "music" | "audio" => Some("audio"),
        "books" | "texts" | "ebooks" => Some("texts"),
        "software" | "applications" | "apps" | "games" => Some("software"),
        "images" => Some("image"),
        _ => None,
    }
}

fn absolute(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}/{}", BASE_URL, href.trim_start_matches('/'))
    }
}
