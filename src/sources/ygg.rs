//! YggTorrent source.
//!
//! Downloads require an account. Each lookup creates a cookie-carrying
//! client, logs in when credentials are configured, and hands the client
//! back as the session that [`Source::resolve`] later reuses.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::debug;

use super::{format_timestamp, parse_count, selector, text_of};
use crate::config::{Credentials, SearchConfig, SourceConfig};
use crate::http::{build_client, download_file, fetch};
use crate::session::SourceSession;
use crate::source::bounded;
use crate::{Artifact, Lookup, Result, ResultLink, SearchError, Source, TorrentResult};

const DEFAULT_BASE_URL: &str = "https://www.yggtorrent.top";

/// YggTorrent source.
pub struct Ygg {
    config: SourceConfig,
    search: SearchConfig,
    credentials: Option<Credentials>,
    base_url: String,
}

impl Ygg {
    /// Creates a new YggTorrent source.
    pub fn new(search: &SearchConfig, credentials: Option<Credentials>) -> Self {
        Self {
            config: SourceConfig {
                name: "Ygg Torrent".to_string(),
                shortcut: "ygg".to_string(),
                requires_session: true,
                enabled: true,
            },
            search: search.clone(),
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the source at another domain.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn search_url(&self, query: &str, category: &str) -> String {
        format!(
            "{}/engine/search?name={}&do=search&category={}",
            self.base_url,
            urlencoding::encode(query),
            category_id(category)
        )
    }

    fn login_url(&self) -> String {
        format!("{}/user/login", self.base_url)
    }

    async fn login(&self, client: &Client, credentials: &Credentials) -> Result<()> {
        debug!(user = %credentials.user, "logging in to ygg");
        let response = client
            .post(self.login_url())
            .form(&[
                ("id", credentials.user.as_str()),
                ("pass", credentials.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SearchError::Auth(format!(
                "login failed with status code {}",
                status.as_u16()
            )));
        }
        Ok(())
    }

    fn parse_results(&self, html: &str) -> Result<Vec<TorrentResult>> {
        let document = Html::parse_document(html);

        let table_selector = selector(".results table")?;
        let row_selector = selector("tbody tr")?;
        let cell_selector = selector("td")?;
        let name_selector = selector("a#torrent_name")?;
        let hidden_selector = selector("div.hidden")?;

        let Some(table) = document.select(&table_selector).next() else {
            if html.contains("Aucun résultat") {
                return Ok(Vec::new());
            }
            return Err(SearchError::Parse(
                "ygg result table not found".to_string(),
            ));
        };

        let mut results = Vec::new();

        for row in table.select(&row_selector) {
            let cells: Vec<_> = row.select(&cell_selector).collect();
            if cells.len() < 9 {
                continue;
            }
            let Some(link) = cells[1].select(&name_selector).next() else {
                continue;
            };
            let name = text_of(link);
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            let upload_date = cells[4]
                .select(&hidden_selector)
                .next()
                .map(text_of)
                .and_then(|ts| ts.parse::<i64>().ok())
                .and_then(format_timestamp)
                .unwrap_or_else(|| text_of(cells[4]));

            let mut result =
                TorrentResult::new(self.shortcut(), name, ResultLink::Description(self.absolute(href)))
                    .with_peers(parse_count(&text_of(cells[7])), parse_count(&text_of(cells[8])));
            let size = text_of(cells[5]);
            if !size.is_empty() {
                result = result.with_size(size);
            }
            if !upload_date.is_empty() {
                result = result.with_upload_date(upload_date);
            }
            results.push(result);
        }

        Ok(results)
    }

    /// Finds the torrent file link on a description page.
    fn parse_description(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        let download_selector = selector(r#"a[href*="download_torrent"]"#)?;

        document
            .select(&download_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| self.absolute(href))
            .ok_or_else(|| {
                SearchError::Parse("No torrent file link on the description page".to_string())
            })
    }

    fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}/{}", self.base_url, href.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl Source for Ygg {
    fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn lookup(&self, query: &str, category: &str, timeout: Duration) -> Result<Lookup> {
        let url = self.search_url(query, category);
        bounded(timeout, async {
            let client = build_client(&self.search, true)?;
            let mut session = SourceSession::new(self.shortcut(), client);
            if let Some(credentials) = &self.credentials {
                self.login(session.client(), credentials).await?;
                session = session.authenticated();
            }

            let html = fetch(session.client(), &url).await?;
            let results = self.parse_results(&html)?;
            Ok(Lookup::new(results).with_session(session))
        })
        .await
    }

    async fn resolve(
        &self,
        item: &TorrentResult,
        session: Option<&SourceSession>,
        dest_dir: &Path,
        timeout: Duration,
    ) -> Result<Artifact> {
        let desc_url = match &item.link {
            ResultLink::Magnet(magnet) => return Ok(Artifact::Magnet(magnet.clone())),
            ResultLink::Description(url) => url,
        };
        let session = session.ok_or_else(|| SearchError::MissingSession(self.shortcut().to_string()))?;

        bounded(timeout, async {
            if !session.is_authenticated() {
                let credentials = self.credentials.as_ref().ok_or_else(|| {
                    SearchError::Auth("no credentials configured for ygg".to_string())
                })?;
                self.login(session.client(), credentials).await?;
            }

            let html = fetch(session.client(), desc_url).await?;
            let file_url = self.parse_description(&html)?;
            let path = download_file(session.client(), &file_url, dest_dir).await?;
            Ok(Artifact::File(path))
        })
        .await
    }
}

/// ygg category id; "all" searches everything.
fn category_id(category: &str) -> &'static str {
    match category.trim().to_lowercase().as_str() {
        "movies" | "video" | "tv" => "2145",
        "music" | "audio" => "2139",
        "apps" | "applications" | "software" => "2144",
        "games" => "2142",
        "books" | "ebooks" => "2140",
        _ => "all",
    }
}
