//! 1337x source.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;

use super::{parse_count, selector, text_of};
use crate::config::{SearchConfig, SourceConfig};
use crate::http::{build_client, fetch};
use crate::session::SourceSession;
use crate::source::bounded;
use crate::{
    Artifact, Lookup, Result, ResultLink, SearchError, Source, TorrentResult, UNREPORTED,
};

const DEFAULT_BASE_URL: &str = "https://1337x.to";

/// 1337x source.
///
/// Results link to description pages; resolving one extracts the magnet.
pub struct Otts {
    config: SourceConfig,
    client: Client,
    base_url: String,
}

impl Otts {
    /// Creates a new 1337x source.
    pub fn new(search: &SearchConfig) -> Result<Self> {
        Ok(Self {
            config: SourceConfig {
                name: "1337x".to_string(),
                shortcut: "otts".to_string(),
                requires_session: false,
                enabled: true,
            },
            client: build_client(search, false)?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the source at a mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, query: &str, category: &str) -> String {
        let query = urlencoding::encode(query);
        match category_path(category) {
            Some(category) => format!(
                "{}/category-search/{}/{}/1/",
                self.base_url, query, category
            ),
            None => format!("{}/search/{}/1/", self.base_url, query),
        }
    }

    fn parse_results(&self, html: &str) -> Result<Vec<TorrentResult>> {
        let document = Html::parse_document(html);

        let table_selector = selector("table.table-list")?;
        let row_selector = selector("tbody tr")?;
        let name_selector = selector(r#"td.coll-1 a[href^="/torrent/"]"#)?;
        let seeds_selector = selector("td.coll-2")?;
        let leeches_selector = selector("td.coll-3")?;
        let date_selector = selector("td.coll-date")?;
        let size_selector = selector("td.coll-4")?;

        let Some(table) = document.select(&table_selector).next() else {
            if html.contains("No results were returned") {
                return Ok(Vec::new());
            }
            return Err(SearchError::Parse(
                "1337x result table not found".to_string(),
            ));
        };

        let mut results = Vec::new();

        for row in table.select(&row_selector) {
            let Some(link) = row.select(&name_selector).next() else {
                continue;
            };
            let name = text_of(link);
            let href = link.value().attr("href").unwrap_or_default();
            if name.is_empty() || href.is_empty() {
                continue;
            }

            let count = |sel: &scraper::Selector| {
                row.select(sel).next().map(|cell| parse_count(&text_of(cell)))
            };
            let seeders = count(&seeds_selector).unwrap_or(UNREPORTED);
            let leechers = count(&leeches_selector).unwrap_or(UNREPORTED);

            // The size cell embeds a hidden seeder count; keep only its own text.
            let size = row
                .select(&size_selector)
                .next()
                .map(|cell| {
                    cell.children()
                        .filter_map(|node| node.value().as_text().map(|t| String::from(&**t)))
                        .collect::<String>()
                        .trim()
                        .to_string()
                })
                .filter(|s| !s.is_empty());

            let mut result = TorrentResult::new(
                self.shortcut(),
                name,
                ResultLink::Description(format!("{}{}", self.base_url, href)),
            )
            .with_peers(seeders, leechers);
            if let Some(size) = size {
                result = result.with_size(size);
            }
            if let Some(date) = row.select(&date_selector).next().map(text_of) {
                if !date.is_empty() {
                    result = result.with_upload_date(date);
                }
            }
            results.push(result);
        }

        Ok(results)
    }

    /// Extracts the magnet link from a torrent description page.
    fn parse_description(html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let detail_selector = selector(".torrent-detail-page li a")?;
        let magnet_selector = selector(r#"a[href^="magnet:"]"#)?;

        document
            .select(&detail_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| href.starts_with("magnet:"))
            .or_else(|| {
                document
                    .select(&magnet_selector)
                    .next()
                    .and_then(|a| a.value().attr("href"))
            })
            .map(str::to_string)
            .ok_or_else(|| SearchError::Parse("Could not extract magnet link".to_string()))
    }
}

#[async_trait]
impl Source for Otts {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn lookup(&self, query: &str, category: &str, timeout: Duration) -> Result<Lookup> {
        let url = self.search_url(query, category);
        bounded(timeout, async {
            let html = fetch(&self.client, &url).await?;
            Ok(Lookup::new(self.parse_results(&html)?))
        })
        .await
    }

    async fn resolve(
        &self,
        item: &TorrentResult,
        _session: Option<&SourceSession>,
        _dest_dir: &Path,
        timeout: Duration,
    ) -> Result<Artifact> {
        let desc_url = match &item.link {
            ResultLink::Magnet(magnet) => return Ok(Artifact::Magnet(magnet.clone())),
            ResultLink::Description(url) => url,
        };
        bounded(timeout, async {
            let html = fetch(&self.client, desc_url).await?;
            Ok(Artifact::Magnet(Self::parse_description(&html)?))
        })
        .await
    }
}

/// 1337x category path segment.
fn category_path(category: &str) -> Option<&'static str> {
    match category.trim().to_lowercase().as_str() {
        "movies" | "video" => Some("Movies"),
        "tv" => Some("TV"),
        "games" => Some("Games"),
        "music" | "audio" => Some("Music"),
        "apps" | "applications" | "software" => Some("Apps"),
        "documentaries" => Some("Documentaries"),
        "anime" => Some("Anime"),
        "xxx" | "porn" => Some("XXX"),
        "other" => Some("Other"),
        _ => None,
    }
}
