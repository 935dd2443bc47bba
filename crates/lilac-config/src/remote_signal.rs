//! Connection settings for a remote signal collaborator: a hosted
//! embedding/titling/categorization service a `Processes`-kind signal or
//! the clustering pipeline's `Titler`/`Categorizer` talks to (spec.md §6
//! "Remote titler/categorizer contract").
//!
//! The shape mirrors the teacher's `TursoConfig`: a handful of flat,
//! `#[serde(default)]` fields plus an `is_configured()` gate, because the
//! same "optional remote backend, empty by default" idiom fits here too.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_max_retries() -> u32 {
    4
}

const fn default_max_tokens_ceiling() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSignalConfig {
    /// Base URL of the remote collaborator, e.g. `https://signals.example.com`.
    #[serde(default)]
    pub base_url: String,

    /// Bearer token or API key for the collaborator.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max retry attempts on transient failure or incomplete output.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound the token-doubling retry loop will grow to.
    #[serde(default = "default_max_tokens_ceiling")]
    pub max_tokens_ceiling: usize,
}

impl Default for RemoteSignalConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_tokens_ceiling: default_max_tokens_ceiling(),
        }
    }
}

impl RemoteSignalConfig {
    /// Whether enough fields are set to attempt a remote call.
    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_configured() {
        let config = RemoteSignalConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.max_tokens_ceiling, 1024);
    }

    #[test]
    fn configured_when_base_url_and_key_set() {
        let config = RemoteSignalConfig {
            base_url: "https://signals.example.com".into(),
            api_key: "key123".into(),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
