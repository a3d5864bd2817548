use serde::Deserialize;
use std::env;
use wingman_core::masked::Masked;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub amadeus: AmadeusConfig,
    pub travel_impact: TravelImpactConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: Masked<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AmadeusConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Masked<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TravelImpactConfig {
    pub base_url: String,
    pub api_key: Masked<String>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 { 20 }

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Attach per-leg emissions to search results.
    #[serde(default = "default_enrich")]
    pub enrich_emissions: bool,
}

fn default_currency() -> String { "USD".to_string() }
fn default_max_results() -> u32 { 250 }
fn default_enrich() -> bool { true }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            max_results: default_max_results(),
            enrich_emissions: default_enrich(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        s.try_deserialize()
    }
}

// Eg.. `WINGMAN_AMADEUS__CLIENT_ID=...` sets `amadeus.client_id`
fn environment() -> config::Environment {
    config::Environment::with_prefix("WINGMAN")
        .prefix_separator("_")
        .separator("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TOML: &str = include_str!("../../config/default.toml");

    #[test]
    fn test_default_file_deserializes() {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_TOML, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.search.default_currency, "USD");
        assert!(cfg.search.enrich_emissions);
        assert_eq!(cfg.amadeus.timeout_seconds, 20);
    }

    #[test]
    fn test_secrets_are_masked_in_debug() {
        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_TOML, config::FileFormat::Toml))
            .set_override("amadeus.client_secret", "hunter2")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.amadeus.client_secret.expose(), "hunter2");
        assert!(!format!("{:?}", cfg).contains("hunter2"));
    }

    #[test]
    fn test_env_overrides_use_single_underscore_prefix() {
        let vars: config::Map<String, String> = [
            ("WINGMAN_AMADEUS__CLIENT_ID", "amadeus-id"),
            ("WINGMAN_TRAVEL_IMPACT__API_KEY", "tim-key"),
            ("WINGMAN_SERVER__PORT", "9090"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_TOML, config::FileFormat::Toml))
            .add_source(environment().source(Some(vars)).try_parsing(true))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.amadeus.client_id, "amadeus-id");
        assert_eq!(cfg.travel_impact.api_key.expose(), "tim-key");
        assert_eq!(cfg.server.port, 9090);
    }
}
