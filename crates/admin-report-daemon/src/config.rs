use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0".to_string(), port: 8001 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let config_dir =
            dirs::config_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join("admin-report");

        Self { path: config_dir.join("arqui.db").to_string_lossy().to_string() }
    }
}

/// Where the habits and tasks providers live.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub habits_url: String,
    pub habits_path: String,
    pub tasks_url: String,
    pub tasks_path: String,
    pub request_timeout_seconds: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            habits_url: "https://habits-microservice-marcorob.c9users.io".to_string(),
            habits_path: "/habits".to_string(),
            tasks_url: "http://10.43.88.167:8080".to_string(),
            tasks_path: "/Task/tasks".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl DaemonConfig {
    /// Default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("admin-report")
            .join("daemon.toml")
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        debug!("Loading daemon configuration from {:?}", config_path);

        if !config_path.exists() {
            info!(
                "Configuration file not found at {:?}, creating default configuration",
                config_path
            );
            let default_config = Self::default();
            default_config.save_to_path(config_path)?;
            return Ok(default_config);
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: DaemonConfig = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        info!("Loaded daemon configuration from {:?}", config_path);
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        debug!("Saving daemon configuration to {:?}", config_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let config_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Saved daemon configuration to {:?}", config_path);
        Ok(())
    }

    /// Apply overrides taken from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.override_database_path(std::env::var("DATABASE_URL").ok());
    }

    /// Replace the configured database path; blank values are ignored.
    pub fn override_database_path(&mut self, path: Option<String>) {
        if let Some(path) = path.filter(|path| !path.trim().is_empty()) {
            info!("Database path overridden: {}", path);
            self.database.path = path;
        }
    }

    /// Validate the configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must not be 0");
        }

        if self.sources.habits_url.trim().is_empty() {
            bail!("No habits provider URL configured");
        }

        if self.sources.tasks_url.trim().is_empty() {
            bail!("No tasks provider URL configured");
        }

        if self.database.path.trim().is_empty() {
            bail!("No database path configured");
        }

        debug!("Configuration validation passed");
        Ok(())
    }
}
