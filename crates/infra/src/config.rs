//! Configuration management.
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (`config/development.toml`, `config/production.toml`)
//! 3. Environment variable overrides with the `STOCKMASTER__` prefix, e.g.
//!    `STOCKMASTER__SERVER__PORT=9000`
//!
//! A `.env` file in the working directory is loaded first when present.

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use stockmaster_inventory::CapacityPolicy;
use stockmaster_observability::LogSettings;

/// Main application configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    #[serde(default)]
    pub log: LogSettings,

    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Whether an inbound delta past warehouse capacity fails or only warns.
    pub capacity_policy: CapacityPolicy,

    /// Extra attempts for a transition that lost an optimistic-lock race.
    pub max_retries: u32,
}

impl AppConfig {
    /// Load configuration from `.env`, files and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let environment =
            std::env::var("STOCKMASTER__ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("log.filter", "info")?
            .set_default("log.format", "json")?
            .set_default("reconciliation.capacity_policy", "enforce")?
            .set_default("reconciliation.max_retries", 3)?
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(
                Environment::with_prefix("STOCKMASTER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            log: LogSettings::default(),
            reconciliation: ReconciliationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            capacity_policy: CapacityPolicy::Enforce,
            max_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enforce_capacity_and_retry_three_times() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.reconciliation.capacity_policy, CapacityPolicy::Enforce);
        assert_eq!(cfg.reconciliation.max_retries, 3);
        assert_eq!(cfg.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn sections_deserialize_from_strings() {
        let cfg = config::Config::builder()
            .set_default("environment", "test")
            .unwrap()
            .set_default("server.host", "127.0.0.1")
            .unwrap()
            .set_default("server.port", 9000)
            .unwrap()
            .set_default("reconciliation.capacity_policy", "warn")
            .unwrap()
            .build()
            .unwrap();

        let cfg: AppConfig = cfg.try_deserialize().unwrap();
        assert_eq!(cfg.reconciliation.capacity_policy, CapacityPolicy::Warn);
        assert_eq!(cfg.reconciliation.max_retries, 3);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.log, LogSettings::default());
    }
}
