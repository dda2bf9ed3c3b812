//! Result aggregation and ranking.

use std::cmp::Ordering;

use crate::TorrentResult;

/// Merges per-source results into one ranked list.
#[derive(Debug, Default, Clone, Copy)]
pub struct Aggregator;

impl Aggregator {
    /// Creates a new aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Concatenates the results of every successful source and ranks them.
    ///
    /// Results are ordered by descending seeder count. Sources that do not
    /// report seeders use a negative sentinel, so those results come after
    /// every result with a real count. Ties are broken by name, then source,
    /// so the order does not depend on which source answered first.
    pub fn merge<I>(&self, outcomes: I) -> Vec<TorrentResult>
    where
        I: IntoIterator<Item = Vec<TorrentResult>>,
    {
        let mut merged: Vec<TorrentResult> = outcomes.into_iter().flatten().collect();
        merged.sort_by(compare);
        merged
    }
}

fn compare(a: &TorrentResult, b: &TorrentResult) -> Ordering {
    // Clamp so every sentinel value ranks the same.
    let seeders = |r: &TorrentResult| r.seeders.max(-1);
    seeders(b)
        .cmp(&seeders(a))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.source.cmp(&b.source))
}
