//! Configuration module for ProdVision
//!
//! Layers, lowest priority first: built-in defaults, `config.toml`, then
//! `PRODVISION__SECTION__KEY` environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APP_DIR: &str = "prodvision";
const ENV_PREFIX: &str = "PRODVISION";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to write configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication and session configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7070
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Path to SQLite database
    pub path: Option<String>,
}

impl DatabaseConfig {
    pub fn get_path(&self) -> PathBuf {
        match &self.path {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => get_data_dir().join("prodvision.db"),
        }
    }
}

/// Session lifetime and housekeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Seconds a login stays valid
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,

    /// Seconds between background sweeps of expired sessions
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Chance that any request triggers a sweep
    #[serde(default = "default_sweep_probability")]
    pub sweep_probability: f64,

    /// Password stored on first start when none is configured
    #[serde(default = "default_admin_password")]
    pub default_admin_password: String,

    /// bcrypt cost for newly stored password hashes
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

fn default_session_lifetime() -> u64 {
    2 * 60 * 60
}

fn default_cleanup_interval() -> u64 {
    30 * 60
}

fn default_sweep_probability() -> f64 {
    0.1
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_password_cost() -> u32 {
    crate::auth::DEFAULT_COST
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime_secs: default_session_lifetime(),
            cleanup_interval_secs: default_cleanup_interval(),
            sweep_probability: default_sweep_probability(),
            default_admin_password: default_admin_password(),
            password_cost: default_password_cost(),
        }
    }
}

impl AuthConfig {
    pub fn session_lifetime(&self) -> Duration {
        Duration::from_secs(self.session_lifetime_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

/// Get the data directory for ProdVision
pub fn get_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".prodvision"))
}

/// Get the config directory for ProdVision
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(get_data_dir)
}

pub fn default_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Load configuration from defaults, an optional TOML file and the environment
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&AppConfig::default())?)
        .add_source(config::File::from(path.as_path()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    tracing::debug!("Loaded configuration (file: {})", path.display());

    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;

    Ok(())
}
