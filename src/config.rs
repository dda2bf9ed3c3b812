//! Search and source configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, SearchError};

/// Browser-like User-Agent sent to every source.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0";

/// Longest per-source lookup bound accepted by [`SearchConfig::validate`].
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Configuration shared by the orchestrator and the built-in sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Total time bound, in seconds, applied identically to every source lookup.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra margin, in milliseconds, the orchestrator waits past `timeout_secs`
    /// before giving up on a source that ignores its own bound.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    /// User-Agent header for source requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Directory where downloaded torrent files are written.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_grace_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            grace_ms: default_grace_ms(),
            user_agent: default_user_agent(),
            download_dir: default_download_dir(),
        }
    }
}

impl SearchConfig {
    /// Per-source lookup bound.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Margin granted past [`timeout`](Self::timeout) before a task is abandoned.
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(SearchError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(SearchError::Config(format!(
                "timeout_secs must be at most {}",
                MAX_TIMEOUT_SECS
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(SearchError::Config("user_agent must not be empty".into()));
        }
        Ok(())
    }
}

/// Static description of a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name of the source.
    pub name: String,
    /// Short identifier used to request the source (e.g., "tpb").
    pub shortcut: String,
    /// Whether downloads need the session produced during search.
    #[serde(default)]
    pub requires_session: bool,
    /// Whether the source is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            shortcut: String::new(),
            requires_session: false,
            enabled: true,
        }
    }
}

/// Login credentials for sources that require an account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name.
    pub user: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Reads `YGG_USER` and `YGG_PASS` from the environment.
    pub fn from_env() -> Option<Self> {
        let user = std::env::var("YGG_USER").ok()?;
        let password = std::env::var("YGG_PASS").ok()?;
        if user.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self::new(user, password))
    }
}

// Keep passwords out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_default() {
        let config = SearchConfig::default();
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.grace_ms, 1000);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.grace(), Duration::from_secs(1));
    }

    #[test]
    fn test_search_config_validate() {
        assert!(SearchConfig::default().validate().is_ok());

        let zero = SearchConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(SearchError::Config(_))));

        let ceiling = SearchConfig {
            timeout_secs: MAX_TIMEOUT_SECS,
            ..Default::default()
        };
        assert!(ceiling.validate().is_ok());

        let huge = SearchConfig {
            timeout_secs: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(SearchError::Config(_))));

        let blank_ua = SearchConfig {
            user_agent: "  ".into(),
            ..Default::default()
        };
        assert!(matches!(blank_ua.validate(), Err(SearchError::Config(_))));
    }

    #[test]
    fn test_search_config_deserialization_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.grace_ms, 1000);
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_source_config_default() {
        let config = SourceConfig::default();
        assert_eq!(config.name, "");
        assert!(!config.requires_session);
        assert!(config.enabled);
    }

    #[test]
    fn test_source_config_deserialization() {
        let json = r#"{"name":"Ygg Torrent","shortcut":"ygg","requires_session":true}"#;
        let config: SourceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.shortcut, "ygg");
        assert!(config.requires_session);
        assert!(config.enabled); // default
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
