//! Layered configuration loading, mirroring the teacher's `figment`-based
//! config crate at a fraction of its scope: a `LilacConfig` assembled from
//! defaults, an optional `lilac.toml`, and `LILAC_`-prefixed, `__`-nested
//! environment variables, in that priority order (later layers win).
//!
//! Used by `lilac-tasks` (worker pool sizing, task-manager gating) and by
//! any `Processes`-kind or remote signal that needs collaborator
//! connection details, rather than every crate reading `std::env`
//! directly.

pub mod error;
pub mod general;
pub mod remote_signal;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use remote_signal::RemoteSignalConfig;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

const ENV_PREFIX: &str = "LILAC_";
const CONFIG_FILE_NAME: &str = "lilac.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LilacConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub remote_signal: RemoteSignalConfig,
}

impl LilacConfig {
    /// Loads from defaults -> `./lilac.toml` -> process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a present `lilac.toml` doesn't
    /// parse or a value doesn't fit its field's type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env_overrides(&[])
    }

    /// Same as [`Self::load`], but merges `overrides` (env-var-shaped
    /// `KEY__NESTED=value` pairs, e.g. from a secrets manager) between the
    /// TOML file and the process environment, so a real `LILAC_`-prefixed
    /// process env var still wins over an override carrying the same key.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_env_overrides(overrides: &[(String, String)]) -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE_NAME))
            .merge(Serialized::defaults(overrides_to_json(overrides)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Ok(figment.extract()?)
    }
}

/// Turns `[("LILAC_REMOTE_SIGNAL__API_KEY", "...")]` into the nested JSON
/// shape figment's `Env` provider would itself produce, so it can be
/// merged as an ordinary lower-priority layer ahead of the real
/// environment.
fn overrides_to_json(overrides: &[(String, String)]) -> JsonValue {
    let mut root = Map::new();
    for (key, value) in overrides {
        let Some(rest) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let parts: Vec<String> = rest.split("__").map(str::to_ascii_lowercase).collect();
        insert_nested(&mut root, &parts, value.clone());
    }
    JsonValue::Object(root)
}

fn insert_nested(map: &mut Map<String, JsonValue>, parts: &[String], value: String) {
    let [head, tail @ ..] = parts else { return };
    if tail.is_empty() {
        map.insert(head.clone(), JsonValue::String(value));
        return;
    }
    let entry = map.entry(head.clone()).or_insert_with(|| JsonValue::Object(Map::new()));
    if let JsonValue::Object(nested) = entry {
        insert_nested(nested, tail, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_serialized_provider() {
        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default())).extract().unwrap();
        assert_eq!(config.general.default_batch_size, 64);
        assert!(!config.remote_signal.is_configured());
    }

    #[test]
    fn overrides_to_json_nests_by_double_underscore() {
        let overrides = vec![("LILAC_REMOTE_SIGNAL__API_KEY".to_string(), "secret".to_string())];
        let json = overrides_to_json(&overrides);
        assert_eq!(json["remote_signal"]["api_key"], "secret");
    }

    #[test]
    fn overrides_without_the_prefix_are_ignored() {
        let overrides = vec![("OTHER_APP__KEY".to_string(), "value".to_string())];
        let json = overrides_to_json(&overrides);
        assert_eq!(json, JsonValue::Object(Map::new()));
    }
}
