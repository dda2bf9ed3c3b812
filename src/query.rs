//! Search query representation.

use serde::{Deserialize, Serialize};

use crate::{Result, SearchError};

/// Source shorthand expanding to every known source.
pub const ALL_SOURCES: &str = "all";

/// A search query with all parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search terms.
    pub query: String,
    /// Category hint. Each source interprets it in its own vocabulary.
    pub category: Option<String>,
    /// Requested source identifiers, or [`ALL_SOURCES`].
    pub sources: Vec<String>,
}

impl SearchQuery {
    /// Creates a new query across all sources.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            category: None,
            sources: vec![ALL_SOURCES.to_string()],
        }
    }

    /// Sets the category hint. Blank categories are ignored.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        let category = category.trim();
        self.category = (!category.is_empty()).then(|| category.to_string());
        self
    }

    /// Sets the sources to query.
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the trimmed query terms, rejecting blank input.
    pub fn terms(&self) -> Result<&str> {
        let terms = self.query.trim();
        if terms.is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        Ok(terms)
    }

    /// Returns the category hint or an empty string.
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_new() {
        let query = SearchQuery::new("barbie 2160p");
        assert_eq!(query.query, "barbie 2160p");
        assert!(query.category.is_none());
        assert_eq!(query.sources, vec!["all".to_string()]);
    }

    #[test]
    fn test_search_query_with_sources() {
        let query = SearchQuery::new("test").with_sources(["tpb", "otts"]);
        assert_eq!(query.sources, vec!["tpb".to_string(), "otts".to_string()]);
    }

    #[test]
    fn test_search_query_with_category() {
        let query = SearchQuery::new("test").with_category(" Movies ");
        assert_eq!(query.category.as_deref(), Some("Movies"));
        assert_eq!(query.category(), "Movies");
    }

    #[test]
    fn test_search_query_blank_category_ignored() {
        let query = SearchQuery::new("test").with_category("   ");
        assert!(query.category.is_none());
        assert_eq!(query.category(), "");
    }

    #[test]
    fn test_terms_trims_whitespace() {
        let query = SearchQuery::new("  ubuntu iso \n");
        assert_eq!(query.terms().unwrap(), "ubuntu iso");
    }

    #[test]
    fn test_terms_rejects_blank() {
        for blank in ["", "   ", "\t\n  "] {
            let query = SearchQuery::new(blank);
            assert!(matches!(query.terms(), Err(SearchError::InvalidQuery(_))));
        }
    }

    #[test]
    fn test_search_query_serialization() {
        let query = SearchQuery::new("test").with_sources(["arc"]);
        let json = serde_json::to_string(&query).unwrap();
        assert!(json.contains("\"query\":\"test\""));
        assert!(json.contains("\"sources\":[\"arc\"]"));
    }
}
