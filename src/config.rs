//! Configuration
//!
//! Layered with figment, later layers overriding earlier ones:
//! 1. Built-in defaults
//! 2. TOML file (optional)
//! 3. `PERMTREE_` environment variables, `__` for nesting
//!    (e.g. `PERMTREE_CACHE__SOFT_CAP=50`)

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::{CacheConfig, InvalidCacheConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PERMTREE_";

/// Default tracing filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "permtree=info";

/// Configuration load errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error(transparent)]
    Cache(#[from] InvalidCacheConfig),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file; None = in-memory
    pub database: Option<PathBuf>,
    /// Tracing filter used when RUST_LOG is unset
    pub log_filter: String,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Per-provider result cache sizing
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_json: false,
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// The layered figment, without extracting
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, an optional TOML file and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(file).extract()?;
        config.cache.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            assert_eq!(config.cache.soft_cap, 35);
            assert_eq!(config.cache.prune_to, 10);
            Ok(())
        });
    }

    #[test]
    fn test_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "permtree.toml",
                r#"
                database = "perms.db"
                log_json = true

                [cache]
                soft_cap = 100
                "#,
            )?;

            let config = Config::load(Some(Path::new("permtree.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.database, Some(PathBuf::from("perms.db")));
            assert!(config.log_json);
            assert_eq!(config.cache.soft_cap, 100);
            assert_eq!(config.cache.prune_to, 10);
            assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("permtree.toml", "log_filter = \"permtree=warn\"")?;
            jail.set_env("PERMTREE_LOG_FILTER", "permtree=debug");
            jail.set_env("PERMTREE_CACHE__PRUNE_TO", "5");

            let config = Config::load(Some(Path::new("permtree.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.log_filter, "permtree=debug");
            assert_eq!(config.cache.prune_to, 5);
            Ok(())
        });
    }

    #[test]
    fn test_prune_target_must_be_below_soft_cap() {
        Jail::expect_with(|jail| {
            jail.set_env("PERMTREE_CACHE__PRUNE_TO", "1000");
            let err = Config::load(None).unwrap_err();
            assert!(matches!(err, ConfigError::Cache(_)));
            assert!(err.to_string().contains("prune_to"));
            Ok(())
        });
    }

    #[test]
    fn test_huge_soft_cap_loads() {
        Jail::expect_with(|jail| {
            jail.set_env("PERMTREE_CACHE__SOFT_CAP", "18446744073709551615");
            let config = Config::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.cache.soft_cap, usize::MAX);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("PERMTREE_CACHE__SOFT_CAP", "lots");
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }
}
