//! Application configuration.
//!
//! Settings live in a TOML file under the platform config directory and can
//! be overridden per-field through `PRESENCE_*` environment variables, which
//! keeps containerized deployments free of mounted config files.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Desktop Chrome user agent; some municipal sites refuse unknown agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database settings.
    pub database: DatabaseConfig,
    /// DNS probe settings.
    pub dns: DnsConfig,
    /// HTTP probe settings.
    pub http: HttpConfig,
    /// Check worker settings.
    pub worker: WorkerConfig,
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. Empty means the default location
    /// under the platform data directory.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
        }
    }
}

/// DNS probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Timeout for a single MX/TXT query, in seconds.
    pub query_timeout_secs: u64,
    /// Timeout for resolving an MX exchange to addresses, in seconds.
    pub resolve_timeout_secs: u64,
    /// Path to a MaxMind country database. GeoIP checks are skipped when
    /// unset or when the file cannot be opened.
    pub geoip_db_path: Option<PathBuf>,
    /// Maximum number of cached geolocation entries.
    pub cache_capacity: usize,
    /// Lifetime of a cached geolocation entry, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            query_timeout_secs: 10,
            resolve_timeout_secs: 10,
            geoip_db_path: None,
            cache_capacity: 1000,
            cache_ttl_secs: 3600,
        }
    }
}

/// HTTP probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// User agent sent with every probe request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Check worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Maximum number of organizations checked concurrently.
    pub max_concurrent_checks: usize,
    /// Wall-clock budget for one organization's checks, in seconds.
    pub task_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: 5,
            task_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to its default location.
    pub fn save(&self) -> ConfigResult<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Location of the configuration file.
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("fr", "suite-territoriale", "presence")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load from an explicit file, without environment overrides.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("PRESENCE_DB_PATH") {
            self.database.path = path;
        }
        if let Some(secs) = env_u64("PRESENCE_HTTP_TIMEOUT_SECS") {
            self.http.timeout_secs = secs;
        }
        if let Ok(agent) = std::env::var("PRESENCE_USER_AGENT") {
            self.http.user_agent = agent;
        }
        if let Ok(path) = std::env::var("PRESENCE_GEOIP_DB_PATH") {
            self.dns.geoip_db_path = Some(PathBuf::from(path));
        }
        if let Some(n) = env_u64("PRESENCE_MAX_CONCURRENT_CHECKS") {
            self.worker.max_concurrent_checks = n as usize;
        }
        if let Some(secs) = env_u64("PRESENCE_TASK_TIMEOUT_SECS") {
            self.worker.task_timeout_secs = secs;
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.worker.max_concurrent_checks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "worker.max_concurrent_checks".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.dns.query_timeout_secs, 10);
        assert_eq!(config.dns.cache_capacity, 1000);
        assert_eq!(config.dns.cache_ttl_secs, 3600);
        assert_eq!(config.http.timeout_secs, 5);
        assert!(config.http.user_agent.contains("Chrome"));
        assert_eq!(config.worker.max_concurrent_checks, 5);
        assert_eq!(config.worker.task_timeout_secs, 60);
        assert!(config.dns.geoip_db_path.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.database.path = "/tmp/presence.db".to_string();
        config.worker.max_concurrent_checks = 12;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let restored: AppConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(restored.database.path, "/tmp/presence.db");
        assert_eq!(restored.worker.max_concurrent_checks, 12);
        assert_eq!(restored.http.timeout_secs, config.http.timeout_secs);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str("[http]\ntimeout_secs = 9\n").unwrap();
        assert_eq!(config.http.timeout_secs, 9);
        assert_eq!(config.http.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.worker.max_concurrent_checks, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[worker]\ntask_timeout_secs = 120\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.worker.task_timeout_secs, 120);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: AppConfig = toml::from_str("[http]\ntimeout_secs = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
