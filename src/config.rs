// src/config.rs
use std::{env, fmt, path::PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_DB_FILENAME: &str = "database.sqlite";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[async_trait]
pub trait ConfigManagerType: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    fn debug_box(&self) -> String;
}

pub struct ConfigManager(pub Box<dyn ConfigManagerType>);

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.debug_box())
    }
}

/// Process environment, seeded from a `.env` file when one exists.
/// Values already present in the environment win over the file.
#[derive(Debug)]
pub struct EnvConfigManager {
    env_file: PathBuf,
}

impl EnvConfigManager {
    pub fn new(env_file: PathBuf) -> Box<Self> {
        if env_file.exists() {
            dotenvy::from_path(&env_file).ok();
            info!("Loaded .env from {}", env_file.display());
        } else {
            debug!(".env not found at {}, using the process environment", env_file.display());
        }

        Box::new(Self { env_file })
    }
}

#[async_trait]
impl ConfigManagerType for EnvConfigManager {
    async fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }

    fn debug_box(&self) -> String {
        format!("EnvConfigManager({})", self.env_file.display())
    }
}

#[derive(Debug, Default)]
pub struct MapConfigManager {
    map: DashMap<String, String>,
}

impl MapConfigManager {
    pub fn new() -> Box<Self> {
        Box::new(Self::default())
    }

    pub fn with(self: Box<Self>, key: &str, value: &str) -> Box<Self> {
        self.map.insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl ConfigManagerType for MapConfigManager {
    async fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).map(|v| v.clone())
    }

    fn debug_box(&self) -> String {
        format!("MapConfigManager({} entries)", self.map.len())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// Settings the bot needs to start.
#[derive(Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub discord_token: String,
    /// Forum the email threads are mirrored into.
    pub forum_channel_id: String,
    pub db_filename: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl BotConfig {
    /// Read every key at once so a misconfigured deployment learns about all
    /// missing values in one go.
    pub async fn load(config: &ConfigManager) -> Result<Self, ConfigError> {
        let (discord_token, forum_channel_id) =
            match (get(config, "DISCORD_TOKEN").await, get(config, "FORUM_CHANNEL_ID").await) {
                (Some(token), Some(forum)) => (token, forum),
                (token, forum) => {
                    let missing = [("DISCORD_TOKEN", token), ("FORUM_CHANNEL_ID", forum)]
                        .into_iter()
                        .filter(|(_, value)| value.is_none())
                        .map(|(key, _)| key.to_string())
                        .collect();
                    return Err(ConfigError::Missing(missing));
                }
            };

        Ok(Self {
            discord_token,
            forum_channel_id,
            db_filename: get(config, "DB_FILENAME")
                .await
                .map_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME), PathBuf::from),
            log_level: get(config, "LOG_LEVEL")
                .await
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_dir: get(config, "LOG_DIR")
                .await
                .map_or_else(|| PathBuf::from(DEFAULT_LOG_DIR), PathBuf::from),
        })
    }
}

/// Blank values count as unset.
async fn get(config: &ConfigManager, key: &str) -> Option<String> {
    config
        .0
        .get(key)
        .await
        .filter(|value| !value.trim().is_empty())
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("discord_token", &"<redacted>")
            .field("forum_channel_id", &self.forum_channel_id)
            .field("db_filename", &self.db_filename)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}
