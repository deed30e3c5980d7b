//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Concurrency configuration.
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
    /// Cost aggregation configuration.
    #[serde(default)]
    pub costing: CostingConfig,
}

/// Concurrency configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum number of retries for a conflicted save before giving up.
    #[serde(default = "default_max_save_retries")]
    pub max_save_retries: u32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_save_retries: default_max_save_retries(),
        }
    }
}

fn default_max_save_retries() -> u32 {
    3
}

/// Cost aggregation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CostingConfig {
    /// Default cost basis: "used", "consumed", or "allocated".
    #[serde(default = "default_cost_basis")]
    pub default_basis: String,
    /// Time-to-live for cached work order cost snapshots, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    /// Maximum number of work orders held in the cost cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

impl Default for CostingConfig {
    fn default() -> Self {
        Self {
            default_basis: default_cost_basis(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_cost_basis() -> String {
    "used".to_string()
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_cache_capacity() -> u64 {
    100
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Pick up a local .env file when one exists.
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLYARD").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig {
            concurrency: ConcurrencyConfig::default(),
            costing: CostingConfig::default(),
        };
        assert_eq!(config.concurrency.max_save_retries, 3);
        assert_eq!(config.costing.default_basis, "used");
        assert_eq!(config.costing.cache_ttl_secs, 300);
        assert_eq!(config.costing.cache_capacity, 100);
    }

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("TALLYARD__CONCURRENCY__MAX_SAVE_RETRIES", Some("5")),
                ("TALLYARD__COSTING__DEFAULT_BASIS", Some("consumed")),
                ("TALLYARD__COSTING__CACHE_TTL_SECS", Some("60")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.concurrency.max_save_retries, 5);
                assert_eq!(config.costing.default_basis, "consumed");
                assert_eq!(config.costing.cache_ttl_secs, 60);
                assert_eq!(config.costing.cache_capacity, 100);
            },
        );
    }

    #[test]
    fn test_load_with_empty_env() {
        temp_env::with_vars_unset(["TALLYARD__CONCURRENCY__MAX_SAVE_RETRIES"], || {
            let config = AppConfig::load().expect("config should load with defaults");
            assert_eq!(config.concurrency.max_save_retries, 3);
        });
    }
}
