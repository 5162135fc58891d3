//! Analyzer configuration and persistence
//!
//! Loads [`AnalyzerConfig`] from a JSON file, applies environment overrides and
//! validates the result. Mirrors the settings persistence used by the game
//! client: a JSON file in the user's configuration directory, with defaults
//! whenever the file is missing.
//!
//! # Load order
//!
//! 1. Built-in defaults
//! 2. JSON file (explicit path, else `config.json` in the project config dir)
//! 3. Environment variables (`XFCHESS_*`)
//!
//! Command line flags are applied on top by the binary.

use super::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Config filename
const CONFIG_FILENAME: &str = "config.json";

pub const ENV_ENGINE_URL: &str = "XFCHESS_ENGINE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "XFCHESS_REQUEST_TIMEOUT_MS";
pub const ENV_HEALTH_TIMEOUT_MS: &str = "XFCHESS_HEALTH_TIMEOUT_MS";
pub const ENV_CACHE_SIZE: &str = "XFCHESS_CACHE_SIZE";
pub const ENV_CACHE_TTL_SECS: &str = "XFCHESS_CACHE_TTL_SECS";

/// Longest accepted cache lifetime (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Top-level configuration for the analysis client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub engine: EngineConfig,
    pub cache: CacheConfig,
}

/// Remote engine connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the analysis server, e.g. `http://127.0.0.1:8000`
    pub server_url: String,
    /// Default deadline for `POST /analyze`
    pub request_timeout_ms: u64,
    /// Deadline for the `GET /health` probe
    pub health_check_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_ms: 60_000,
            health_check_timeout_ms: 3_000,
        }
    }
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }

    /// Parse `server_url`
    pub fn base_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.server_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.server_url.clone(),
            source,
        })
    }
}

/// Result cache and history bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_size: usize,
    pub ttl_secs: u64,
    pub history_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 500,
            ttl_secs: 60 * 60,
            history_limit: 50,
        }
    }
}

impl CacheConfig {
    /// Cache lifetime, saturating at the largest representable delta
    pub fn ttl(&self) -> chrono::Duration {
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Resolve the default config file path
///
/// Returns `config.json` in the user's configuration directory, falling back
/// to the working directory if no config dir can be determined.
pub fn default_config_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "trilltino", "XFChess") {
        proj_dirs.config_dir().join(CONFIG_FILENAME)
    } else {
        PathBuf::from(CONFIG_FILENAME)
    }
}

impl AnalyzerConfig {
    /// Load configuration from `path`, or from the default location
    ///
    /// An explicit path must exist. The default location is optional: when it
    /// is missing the defaults are used. Environment overrides are applied and
    /// the result is validated before returning.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    info!(
                        "[CONFIG] No config file found at {:?}. Using defaults.",
                        default_path
                    );
                    Self::default()
                }
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&contents)?;
        info!("[CONFIG] Loaded config from {:?}", path);
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("[CONFIG] Saved config to {:?}", path);
        Ok(())
    }

    /// Apply `XFCHESS_*` overrides obtained through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_ENGINE_URL) {
            self.engine.server_url = url;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.engine.request_timeout_ms = parse_env(ENV_REQUEST_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_HEALTH_TIMEOUT_MS) {
            self.engine.health_check_timeout_ms = parse_env(ENV_HEALTH_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_CACHE_SIZE) {
            self.cache.max_size = parse_env(ENV_CACHE_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache.ttl_secs = parse_env(ENV_CACHE_TTL_SECS, &value)?;
        }
        Ok(())
    }

    /// Reject configurations the client cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        self.engine.base_url()?;
        if self.engine.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.request_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.engine.health_check_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "engine.health_check_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.cache.max_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_size",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.cache.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs",
                message: format!("must be at most {MAX_CACHE_TTL_SECS}"),
            });
        }
        if self.cache.history_limit == 0 {
            warn!("[CONFIG] cache.history_limit is 0, analysis history will stay empty");
        }
        Ok(())
    }
}

fn parse_env<T>(key: &'static str, value: &str) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            field: key,
            message: format!("'{value}': {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        //! Defaults used when no config file or environment override exists
        let config = AnalyzerConfig::default();
        assert_eq!(config.engine.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.engine.health_check_timeout(), Duration::from_secs(3));
        assert_eq!(config.cache.max_size, 500);
        assert_eq!(config.cache.history_limit, 50);
        assert_eq!(config.cache.ttl(), chrono::Duration::hours(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{"engine": {"server_url": "http://10.0.0.2:9000"}}"#).unwrap();
        assert_eq!(config.engine.server_url, "http://10.0.0.2:9000");
        assert_eq!(config.engine.request_timeout_ms, 60_000);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_ENGINE_URL, "http://engine.local:8000"),
            (ENV_REQUEST_TIMEOUT_MS, "90000"),
            (ENV_CACHE_SIZE, " 10 "),
        ]
        .into_iter()
        .collect();

        let mut config = AnalyzerConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.engine.server_url, "http://engine.local:8000");
        assert_eq!(config.engine.request_timeout_ms, 90_000);
        assert_eq!(config.engine.health_check_timeout_ms, 3_000);
        assert_eq!(config.cache.max_size, 10);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = AnalyzerConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == ENV_CACHE_TTL_SECS).then(|| "an hour".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: ENV_CACHE_TTL_SECS, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalyzerConfig::default();
        config.engine.server_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut config = AnalyzerConfig::default();
        config.cache.max_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "cache.max_size", .. })
        ));

        let mut config = AnalyzerConfig::default();
        config.engine.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_ttl() {
        //! A TTL that would overflow timestamp arithmetic is refused up front
        let vars: HashMap<&str, &str> =
            [(ENV_CACHE_TTL_SECS, "18446744073709551615")].into_iter().collect();
        let mut config = AnalyzerConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "cache.ttl_secs", .. })
        ));

        config.cache.ttl_secs = MAX_CACHE_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_saturates_instead_of_panicking() {
        let cache = CacheConfig {
            ttl_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(cache.ttl(), chrono::TimeDelta::MAX);

        let cache = CacheConfig {
            ttl_secs: i64::MAX as u64,
            ..Default::default()
        };
        assert_eq!(cache.ttl(), chrono::TimeDelta::MAX);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let mut config = AnalyzerConfig::default();
        config.cache.ttl_secs = 120;
        config.save(&path).unwrap();

        let loaded = AnalyzerConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnalyzerConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
