use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::DEFAULT_CLAUDE_MODEL;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoundtableConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,

    #[serde(default = "default_pool_min")]
    pub pool_min_connections: u32,

    #[serde(default = "default_pool_max")]
    pub pool_max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub pool_acquire_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub pool_idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Ceiling on a single member turn before the round moves on.
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_secs: u64,

    /// Transcript rows fed into each round's base history.
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,

    #[serde(default)]
    pub claude: ClaudeEngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeEngineConfig {
    #[serde(default = "default_claude_binary")]
    pub binary: String,

    #[serde(default = "default_claude_model")]
    pub model: String,

    #[serde(default = "default_claude_max_turns")]
    pub max_turns: u32,
}

fn default_database_path() -> String {
    "./data/roundtable.db".to_string()
}

fn default_pool_min() -> u32 {
    1
}

fn default_pool_max() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_turn_timeout() -> u64 {
    600
}

fn default_history_limit() -> i64 {
    30
}

fn default_claude_binary() -> String {
    "claude".to_string()
}

fn default_claude_model() -> String {
    DEFAULT_CLAUDE_MODEL.to_string()
}

fn default_claude_max_turns() -> u32 {
    50
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            pool_min_connections: default_pool_min(),
            pool_max_connections: default_pool_max(),
            pool_acquire_timeout_secs: default_acquire_timeout(),
            pool_idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: default_turn_timeout(),
            history_limit: default_history_limit(),
            claude: ClaudeEngineConfig::default(),
        }
    }
}

impl Default for ClaudeEngineConfig {
    fn default() -> Self {
        Self {
            binary: default_claude_binary(),
            model: default_claude_model(),
            max_turns: default_claude_max_turns(),
        }
    }
}

impl RoundtableConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ROUNDTABLE")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut roundtable_config: RoundtableConfig = config.try_deserialize().unwrap_or_default();

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            roundtable_config.database.path = path;
        } else if let Ok(path) = std::env::var("ROUNDTABLE_DATABASE_PATH") {
            roundtable_config.database.path = path;
        }

        if let Ok(level) = std::env::var("ROUNDTABLE_LOG_LEVEL") {
            roundtable_config.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            roundtable_config.logging.level = level;
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                roundtable_config.server.port = port;
            }
        }

        roundtable_config.validate()?;

        Ok(roundtable_config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.database.path.is_empty() {
            return Err(ConfigLoadError::MissingRequired(
                "database.path".to_string(),
            ));
        }

        if self.database.pool_min_connections > self.database.pool_max_connections {
            return Err(ConfigLoadError::InvalidValue {
                key: "database.pool_min_connections".to_string(),
                message: "Cannot be greater than pool_max_connections".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "server.port".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.agents.turn_timeout_secs == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "agents.turn_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.agents.history_limit <= 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "agents.history_limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.agents.claude.max_turns == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "agents.claude.max_turns".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        let level_lower = self.logging.level.to_lowercase();
        if !valid_levels.contains(&level_lower.as_str()) && !level_lower.contains('=') {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Must be one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        Ok(())
    }

    pub fn database_path(&self) -> &str {
        &self.database.path
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.agents.turn_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("roundtable.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("roundtable").join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".roundtable").join("config.toml"));
        paths.push(home.join(".config").join("roundtable").join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    let env_paths = get_dotenv_paths();

    for path in env_paths {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn get_dotenv_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".roundtable").join(".env"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("roundtable").join(".env"));
    }

    paths
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("roundtable"))
}

pub fn get_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("roundtable"))
}

pub fn ensure_config_dir() -> Result<PathBuf, std::io::Error> {
    let config_dir = get_config_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine config directory",
        )
    })?;

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn ensure_data_dir() -> Result<PathBuf, std::io::Error> {
    let data_dir = get_data_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        )
    })?;

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}
