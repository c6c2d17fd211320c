//! Configuration loading
//!
//! Resolution priority, highest first:
//! 1. Command-line arguments ([`ConfigOverrides`])
//! 2. Environment variables (`FILMFLIX_*`, plus `PORT` and `ADMIN_KEY`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing config file is not an error; the defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the TOML config file
pub const CONFIG_ENV: &str = "FILMFLIX_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Shared secret for mutating requests; `None` rejects every mutation
    pub admin_key: Option<String>,
    /// Directory served for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Re-validate `films` ids on actor/director PATCH
    pub validate_patch_references: bool,
    pub logging: LoggingConfig,
    pub sync: SyncConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            database_path: default_database_path(),
            admin_key: None,
            static_dir: None,
            validate_patch_references: false,
            logging: LoggingConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Sync outbox worker tuning
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Attempts before an intent becomes a dead letter
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub poll_interval_ms: u64,
    /// Outbox rows fetched per query
    pub batch_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_backoff_ms: 500,
            max_backoff_ms: 60_000,
            poll_interval_ms: 1_000,
            batch_size: 64,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Delay before retry number `attempts` (1-based): doubles each time,
    /// capped at `max_backoff_ms`, never zero
    pub fn backoff_ms(&self, attempts: u32) -> u64 {
        let factor = 1u64
            .checked_shl(attempts.saturating_sub(1))
            .unwrap_or(u64::MAX);
        self.base_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms)
            .max(1)
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub admin_key: Option<String>,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Resolve the effective configuration from every source.
    ///
    /// Returns the config and the TOML file it was read from, if any.
    pub fn resolve(overrides: &ConfigOverrides) -> Result<(Config, Option<PathBuf>)> {
        let lookup = |key: &str| std::env::var(key).ok();

        let path = overrides
            .config_file
            .clone()
            .or_else(|| lookup(CONFIG_ENV).map(PathBuf::from))
            .or_else(default_config_path);

        let (mut config, source) = match path {
            Some(path) if path.exists() => (Config::load_toml(&path)?, Some(path)),
            _ => (Config::default(), None),
        };

        config.apply_env(lookup)?;
        config.apply_overrides(overrides);
        Ok((config, source))
    }

    pub fn load_toml(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;
        Config::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("FILMFLIX_BIND_ADDRESS") {
            self.bind_address = address;
        }
        if let Some(port) = lookup("FILMFLIX_PORT").or_else(|| lookup("PORT")) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid port: {port}")))?;
        }
        if let Some(path) = lookup("FILMFLIX_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(key) = lookup("FILMFLIX_ADMIN_KEY").or_else(|| lookup("ADMIN_KEY")) {
            self.admin_key = Some(key);
        }
        if let Some(dir) = lookup("FILMFLIX_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup("FILMFLIX_VALIDATE_PATCH_REFERENCES") {
            self.validate_patch_references = parse_flag(&flag)?;
        }
        if let Some(level) = lookup("FILMFLIX_LOG_LEVEL") {
            self.logging.level = level;
        }
        // An empty key is treated as no key
        if self.admin_key.as_deref().is_some_and(|key| key.is_empty()) {
            self.admin_key = None;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(path) = &overrides.database_path {
            self.database_path = path.clone();
        }
        if let Some(key) = overrides.admin_key.as_ref().filter(|key| !key.is_empty()) {
            self.admin_key = Some(key.clone());
        }
        if let Some(dir) = &overrides.static_dir {
            self.static_dir = Some(dir.clone());
        }
    }

    /// `bind_address:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("Invalid boolean: {other}"))),
    }
}

/// `<config dir>/filmflix/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("filmflix").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("filmflix"))
        .unwrap_or_else(|| PathBuf::from("./filmflix_data"))
        .join("filmflix.db")
}
