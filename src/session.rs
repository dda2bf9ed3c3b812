//! Source sessions retained between search and download.
//!
//! A session is produced by a source during lookup (typically a cookie-carrying
//! HTTP client after login) and handed, unchanged, to that same source when a
//! result is later downloaded. Sessions are deliberately not `Clone`: the
//! search result set owns them and the dispatcher only borrows.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;

use crate::registry::source_id;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Opaque, source-scoped handle reused by a later download.
pub struct SourceSession {
    id: SessionId,
    source: String,
    client: Client,
    authenticated: bool,
}

impl SourceSession {
    /// Wraps `client` as the session of `source`.
    pub fn new(source: impl Into<String>, client: Client) -> Self {
        Self {
            id: SessionId::next(),
            source: source.into(),
            client,
            authenticated: false,
        }
    }

    /// Marks the session as logged in.
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    /// Session identity.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Source that produced this session.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// HTTP client carrying the session's cookies.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Whether the source accepted credentials when the session was created.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl fmt::Debug for SourceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSession")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

/// Sessions retained by a search, keyed by source identifier.
#[derive(Debug, Default)]
pub struct Sessions {
    by_source: HashMap<String, SourceSession>,
}

impl Sessions {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains `session` under its source, replacing any previous one.
    pub fn insert(&mut self, session: SourceSession) -> Option<SourceSession> {
        self.by_source.insert(source_id(&session.source), session)
    }

    /// Returns the session retained for `source`.
    pub fn get(&self, source: &str) -> Option<&SourceSession> {
        self.by_source.get(&source_id(source))
    }

    /// Removes and returns the session retained for `source`.
    pub fn remove(&mut self, source: &str) -> Option<SourceSession> {
        self.by_source.remove(&source_id(source))
    }

    /// Number of retained sessions.
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    /// Whether no session is retained.
    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    /// Sources with a retained session.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.by_source.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SourceSession::new("ygg", Client::new());
        let b = SourceSession::new("ygg", Client::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_session_authenticated() {
        let session = SourceSession::new("ygg", Client::new());
        assert!(!session.is_authenticated());
        let session = session.authenticated();
        assert!(session.is_authenticated());
        assert_eq!(session.source(), "ygg");
    }

    #[test]
    fn test_sessions_keyed_by_source() {
        let mut sessions = Sessions::new();
        assert!(sessions.is_empty());

        let session = SourceSession::new("ygg", Client::new());
        let id = session.id();
        assert!(sessions.insert(session).is_none());

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.get("ygg").map(SourceSession::id), Some(id));
        assert_eq!(sessions.get(" YGG ").map(SourceSession::id), Some(id));
        assert!(sessions.get("tpb").is_none());
        assert_eq!(sessions.sources().collect::<Vec<_>>(), vec!["ygg"]);

        let removed = sessions.remove("ygg").unwrap();
        assert_eq!(removed.id(), id);
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_session_debug_and_display() {
        let session = SourceSession::new("ygg", Client::new());
        let debug = format!("{:?}", session);
        assert!(debug.contains("SourceSession"));
        assert!(debug.contains("ygg"));
        assert!(session.id().to_string().starts_with("session-"));
    }
}
