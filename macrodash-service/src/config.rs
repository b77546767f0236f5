//! Dashboard configuration loaded from `macrodash.toml`.
//!
//! Every section is optional. Secrets may come from the environment instead
//! of the file: `FRED_API_KEY` and `MACRODASH_ADMIN_PASSWORD` take precedence
//! over `[fred].api_key` and `[admin].password`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use macrodash_core::domain::{default_indicators, Indicator};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "macrodash.toml";

pub const ENV_FRED_API_KEY: &str = "FRED_API_KEY";
pub const ENV_ADMIN_PASSWORD: &str = "MACRODASH_ADMIN_PASSWORD";

/// Errors from config loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the dashboard's static assets.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            static_dir: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Years of history requested from providers.
    pub history_years: u32,
    /// Pause between consecutive provider requests.
    pub request_delay_ms: u64,
    /// Never touch the network; serve only what is in the store.
    pub offline: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            history_years: 10,
            request_delay_ms: 500,
            offline: false,
        }
    }
}

impl FetchConfig {
    pub fn request_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FredConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared admin password. Admin endpoints are disabled when unset.
    pub password: Option<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub fetch: FetchConfig,
    pub fred: FredConfig,
    pub admin: AdminConfig,
    pub indicators: Vec<Indicator>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            fetch: FetchConfig::default(),
            fred: FredConfig::default(),
            admin: AdminConfig::default(),
            indicators: default_indicators(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the effective config: an explicit path must exist; otherwise
    /// `macrodash.toml` is used when present, else the defaults. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                tracing::debug!("no config file found; using defaults");
                Self::default()
            }
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply secret overrides from `lookup` (normally the process environment).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(ENV_FRED_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.fred.api_key = Some(key);
        }
        if let Some(password) = lookup(ENV_ADMIN_PASSWORD).filter(|v| !v.is_empty()) {
            self.admin.password = Some(password);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.history_years == 0 {
            return Err(ConfigError::Invalid(
                "fetch.history_years must be at least 1".into(),
            ));
        }
        let mut seen = HashSet::new();
        for indicator in &self.indicators {
            if !Indicator::is_valid_key(&indicator.key) {
                return Err(ConfigError::Invalid(format!(
                    "indicator key '{}' may only contain letters, digits, '_' and '-'",
                    indicator.key
                )));
            }
            if indicator.source_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "indicator '{}' has an empty source_id",
                    indicator.key
                )));
            }
            if !seen.insert(indicator.key.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate indicator key '{}'",
                    indicator.key
                )));
            }
        }
        Ok(())
    }

    pub fn indicator(&self, key: &str) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.key == key)
    }

    /// Look up each key in the registry; unknown keys are returned as errors.
    pub fn select(&self, keys: &[String]) -> Result<Vec<Indicator>, ConfigError> {
        if keys.is_empty() {
            return Ok(self.indicators.clone());
        }
        keys.iter()
            .map(|k| {
                self.indicator(k)
                    .cloned()
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown indicator '{k}'")))
            })
            .collect()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
