//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Jail,
};
use lilac_config::LilacConfig;

#[test]
fn loads_remote_signal_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "lilac.toml",
            r#"
[remote_signal]
base_url = "https://signals.example.com"
api_key = "toml-key"
timeout_secs = 90
max_retries = 6
max_tokens_ceiling = 2048
"#,
        )?;

        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default())).merge(Toml::file("lilac.toml")).extract()?;

        assert_eq!(config.remote_signal.base_url, "https://signals.example.com");
        assert_eq!(config.remote_signal.api_key, "toml-key");
        assert_eq!(config.remote_signal.timeout_secs, 90);
        assert_eq!(config.remote_signal.max_retries, 6);
        assert_eq!(config.remote_signal.max_tokens_ceiling, 2048);
        assert!(config.remote_signal.is_configured());
        Ok(())
    });
}

#[test]
fn loads_full_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "lilac.toml",
            r#"
[general]
default_batch_size = 128
default_result_limit = 50
overwrite_enrichments = true
require_task_manager = true

[remote_signal]
base_url = "https://signals.example.com"
api_key = "toml-key"
"#,
        )?;

        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default())).merge(Toml::file("lilac.toml")).extract()?;

        assert_eq!(config.general.default_batch_size, 128);
        assert_eq!(config.general.default_result_limit, 50);
        assert!(config.general.overwrite_enrichments);
        assert!(config.general.require_task_manager);
        assert!(config.remote_signal.is_configured());
        Ok(())
    });
}

#[test]
fn env_var_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.set_env("LILAC_REMOTE_SIGNAL__BASE_URL", "https://from-env.example.com");

        jail.create_file(
            "lilac.toml",
            r#"
[remote_signal]
base_url = "https://from-toml.example.com"
api_key = "toml-key"
"#,
        )?;

        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default()))
            .merge(Toml::file("lilac.toml"))
            .merge(Env::prefixed("LILAC_").split("__"))
            .extract()?;

        // Env should win over TOML.
        assert_eq!(config.remote_signal.base_url, "https://from-env.example.com");
        // TOML value not overridden by env should remain.
        assert_eq!(config.remote_signal.api_key, "toml-key");
        Ok(())
    });
}

#[test]
fn env_var_overrides_default() {
    Jail::expect_with(|jail| {
        jail.set_env("LILAC_GENERAL__DEFAULT_RESULT_LIMIT", "99");

        // No TOML file -- just defaults + env.
        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default())).merge(Env::prefixed("LILAC_").split("__")).extract()?;

        assert_eq!(config.general.default_result_limit, 99);
        Ok(())
    });
}

/// Documents the figment gotcha: typo'd env var keys are silently ignored.
/// The value stays at its default because figment doesn't know "urll" should be "url".
#[test]
fn typo_env_var_silently_ignored() {
    Jail::expect_with(|jail| {
        jail.set_env("LILAC_REMOTE_SIGNAL__BASE_URLL", "https://typo.example.com");

        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default())).merge(Env::prefixed("LILAC_").split("__")).extract()?;

        assert!(config.remote_signal.base_url.is_empty(), "typo'd env var should be silently ignored by figment");
        Ok(())
    });
}

#[test]
fn full_env_provider_chain() {
    Jail::expect_with(|jail| {
        jail.set_env("LILAC_REMOTE_SIGNAL__BASE_URL", "https://jail.example.com");
        jail.set_env("LILAC_REMOTE_SIGNAL__API_KEY", "jail-key");
        jail.set_env("LILAC_GENERAL__DEFAULT_BATCH_SIZE", "256");

        let config: LilacConfig = Figment::from(Serialized::defaults(LilacConfig::default())).merge(Env::prefixed("LILAC_").split("__")).extract()?;

        assert_eq!(config.remote_signal.base_url, "https://jail.example.com");
        assert_eq!(config.remote_signal.api_key, "jail-key");
        assert!(config.remote_signal.is_configured());
        assert_eq!(config.general.default_batch_size, 256);
        Ok(())
    });
}
