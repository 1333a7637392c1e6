use anyhow::Result;
use figment::{Figment, providers::{Env, Format, Serialized, Toml}};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use url::Url;

use crate::filter::FALLBACK_MAX_LIQUIDITY;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub operating_mode: OperatingMode,
    pub api_base: String,
    pub chain_id: u64,
    pub request_timeout_ms: u64,
    /// Slider ceiling used while no vault has been loaded.
    pub default_max_liquidity: Decimal,
    pub ui_settings: UiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperatingMode {
    Live,
    Demo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    pub refresh_rate_ms: u64,
    pub slider_steps: u32,
    pub show_debug_info: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operating_mode: OperatingMode::Live,
            api_base: "http://localhost:8001".to_string(),
            chain_id: 1,
            request_timeout_ms: 30_000,
            default_max_liquidity: FALLBACK_MAX_LIQUIDITY,
            ui_settings: UiSettings::default(),
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            refresh_rate_ms: 100,
            slider_steps: 100,
            show_debug_info: false,
        }
    }
}

pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_file = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

    let config: Config = figment(config_file).extract()?;

    validate_config(&config)?;

    Ok(config)
}

/// Defaults, then the TOML file, then `VAULTS_*`, then a bare `API_BASE`.
fn figment(config_file: &str) -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_file))
        .merge(Env::prefixed("VAULTS_").split("__"))
        .merge(Env::raw().only(&["API_BASE"]))
}

pub fn generate_sample_config() -> Result<()> {
    let config = Config::default();
    save_config_to_file(&config, DEFAULT_CONFIG_FILE)
}

fn validate_config(config: &Config) -> Result<()> {
    let api_base = Url::parse(&config.api_base)
        .map_err(|e| anyhow::anyhow!("api_base '{}' is not a valid URL: {}", config.api_base, e))?;
    if !matches!(api_base.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!("api_base must use http or https, got '{}'", api_base.scheme()));
    }

    if config.request_timeout_ms < 1000 {
        return Err(anyhow::anyhow!("request_timeout_ms must be at least 1000ms"));
    }

    if config.default_max_liquidity <= Decimal::ZERO {
        return Err(anyhow::anyhow!("default_max_liquidity must be positive"));
    }

    if config.ui_settings.refresh_rate_ms < 50 {
        return Err(anyhow::anyhow!("UI refresh_rate_ms must be at least 50ms"));
    }

    if config.ui_settings.slider_steps == 0 {
        return Err(anyhow::anyhow!("UI slider_steps must be at least 1"));
    }

    Ok(())
}

pub fn save_config_to_file(config: &Config, path: &str) -> Result<()> {
    let toml_content = toml::to_string_pretty(config)?;
    fs::write(path, toml_content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_apply_without_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            let config = load_config(Some("missing.toml")).expect("defaults are valid");
            assert_eq!(config.api_base, "http://localhost:8001");
            assert_eq!(config.chain_id, 1);
            assert_eq!(config.default_max_liquidity, dec!(1000000));
            assert_eq!(config.operating_mode, OperatingMode::Live);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    api_base = "http://10.0.0.5:9000"
                    chain_id = 42161
                    operating_mode = "Demo"

                    [ui_settings]
                    slider_steps = 20
                "#,
            )?;
            jail.clear_env();
            jail.set_env("VAULTS_CHAIN_ID", "10");
            jail.set_env("API_BASE", "https://vaults.example.org");

            let config = load_config(None).expect("valid config");
            assert_eq!(config.api_base, "https://vaults.example.org");
            assert_eq!(config.chain_id, 10);
            assert_eq!(config.operating_mode, OperatingMode::Demo);
            assert_eq!(config.ui_settings.slider_steps, 20);
            assert_eq!(config.ui_settings.refresh_rate_ms, 100);
            Ok(())
        });
    }

    #[test]
    fn rejects_non_http_base() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("API_BASE", "ftp://localhost");
            assert!(load_config(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn ambient_chain_variable_is_ignored_once_cleared() {
        Jail::expect_with(|jail| {
            jail.set_env("VAULTS_CHAIN_ID", "137");
            jail.set_env("API_BASE", "http://10.1.1.1:9");
            jail.clear_env();

            let config = load_config(None).expect("defaults are valid");
            assert_eq!(config.chain_id, 1);
            assert_eq!(config.api_base, "http://localhost:8001");
            Ok(())
        });
    }

    #[test]
    fn rejects_zero_slider_steps() {
        let mut config = Config::default();
        config.ui_settings.slider_steps = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn sample_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.api_base, Config::default().api_base);
        assert_eq!(parsed.default_max_liquidity, dec!(1000000));
    }
}
