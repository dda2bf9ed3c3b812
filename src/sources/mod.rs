//! Torrent source implementations.

mod arc;
mod otts;
mod tpb;
mod ygg;

pub use arc::Archive;
pub use otts::Otts;
pub use tpb::PirateBay;
pub use ygg::Ygg;

use scraper::{ElementRef, Selector};

use crate::{Result, SearchError, UNREPORTED};

/// Parses a CSS selector, reporting failures as parse errors.
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector '{}': {:?}", css, e)))
}

/// Collected, trimmed text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parses a seeder/leecher count such as `"1,234"`, or [`UNREPORTED`].
pub(crate) fn parse_count(raw: &str) -> i64 {
    let digits: String = raw.chars().filter(|c| !matches!(c, ',' | ' ')).collect();
    digits.parse::<i64>().ok().filter(|n| *n >= 0).unwrap_or(UNREPORTED)
}

/// Formats an epoch timestamp as a UTC date.
pub(crate) fn format_timestamp(secs: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}
