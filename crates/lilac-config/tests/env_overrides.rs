use figment::Jail;
use lilac_config::LilacConfig;

#[test]
fn external_overrides_fill_config_values() {
    Jail::expect_with(|_jail| {
        let overrides = vec![("LILAC_REMOTE_SIGNAL__API_KEY".to_string(), "key-from-external".to_string())];

        let config = LilacConfig::load_with_env_overrides(&overrides).expect("config loads");
        assert_eq!(config.remote_signal.api_key, "key-from-external");
        Ok(())
    });
}

#[test]
fn process_env_beats_external_overrides() {
    Jail::expect_with(|jail| {
        jail.set_env("LILAC_REMOTE_SIGNAL__API_KEY", "key-from-env");
        let overrides = vec![("LILAC_REMOTE_SIGNAL__API_KEY".to_string(), "key-from-external".to_string())];

        let config = LilacConfig::load_with_env_overrides(&overrides).expect("config loads");
        assert_eq!(config.remote_signal.api_key, "key-from-env");
        Ok(())
    });
}
