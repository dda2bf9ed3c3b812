//! HTTP helpers shared by the sources: page fetch and torrent file download.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::SearchConfig;
use crate::{Result, SearchError};

/// Builds a client for source requests.
///
/// `cookies` enables the cookie store, which login-gated sources rely on to
/// keep the session between requests.
pub fn build_client(config: &SearchConfig, cookies: bool) -> Result<Client> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .cookie_store(cookies)
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Fetches `url` and returns the body as text.
pub async fn fetch(client: &Client, url: &str) -> Result<String> {
    debug!(%url, "fetching page");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Downloads the torrent file at `url` into `dest_dir` and returns its path.
///
/// The file name comes from `Content-Disposition` when present, otherwise
/// from the last path segment of the URL. Existing files are never
/// overwritten.
pub async fn download_file(client: &Client, url: &str, dest_dir: &Path) -> Result<PathBuf> {
    debug!(%url, "downloading torrent file");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let name = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(file_name_from_disposition)
        .or_else(|| file_name_from_url(url))
        .unwrap_or_else(|| "download".to_string());

    let bytes = response.bytes().await?;
    save(dest_dir, &name, &bytes).await
}

/// Writes `bytes` under `dest_dir` using a sanitized, non-clashing `name`.
///
/// Each candidate is created exclusively, so concurrent saves of the same
/// name land in distinct files.
pub async fn save(dest_dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dest_dir).await?;
    let name = sanitize_file_name(name);
    let stem = name.strip_suffix(".torrent").unwrap_or(&name);

    let mut attempt: u32 = 0;
    loop {
        let path = if attempt == 0 {
            dest_dir.join(&name)
        } else {
            dest_dir.join(format!("{stem} ({attempt}).torrent"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                debug!(path = %path.display(), size = bytes.len(), "saved file");
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

fn disposition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'')?"?([^";]+)"?"#)
            .unwrap_or_else(|e| panic!("invalid Content-Disposition pattern: {e}"))
    })
}

/// Extracts the file name from a `Content-Disposition` header value.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    let raw = disposition_regex().captures(header)?.get(1)?.as_str().trim();
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    (!decoded.is_empty()).then_some(decoded)
}

fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment).ok()?.into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

/// Makes `name` safe to use as a single file name ending in `.torrent`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').trim();
    let cleaned = if cleaned.is_empty() { "download" } else { cleaned };

    if cleaned.to_lowercase().ends_with(".torrent") {
        cleaned.to_string()
    } else {
        format!("{cleaned}.torrent")
    }
}
