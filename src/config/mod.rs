//! # Configuration Management Module
//!
//! TOML configuration for the dungeon engine, loaded asynchronously.
//!
//! ## Configuration Structure
//!
//! - [`EngineConfig`] - RNG seed and default difficulty
//! - [`StorageConfig`] - where the sled database lives
//! - [`LoggingConfig`] - log level and optional log file
//! - `difficulties` - named [`DifficultyProfile`] tables; missing ones fall back to
//!   the built-in easy/medium/hard profiles
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dungeon_rpg::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("storing dungeons under {}", config.db_path());
//!     Ok(())
//! }
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [engine]
//! seed = 1234
//! default_difficulty = "medium"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "dungeon-rpg.log"
//!
//! [difficulties.nightmare]
//! min_rooms = 12
//! max_rooms = 18
//! min_room_size = 3
//! max_room_size = 5
//! enemy_density = 0.09
//! treasure_density = 0.01
//! door_chance = 0.9
//! width = 60
//! height = 40
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::fs;

use crate::dungeon::{Catalog, DifficultyProfile};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub difficulties: BTreeMap<String, DifficultyProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fixed seed for reproducible runs; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_difficulty")]
    pub default_difficulty: String,
}

fn default_difficulty() -> String {
    "easy".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            default_difficulty: default_difficulty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Overrides `<data_dir>/dungeons`.
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn db_path(&self) -> String {
        match &self.storage.db_path {
            Some(p) => p.clone(),
            None => format!("{}/dungeons", self.storage.data_dir.trim_end_matches('/')),
        }
    }

    /// Built-in profiles overlaid with the configured ones; names are case-insensitive.
    pub fn difficulty_profiles(&self) -> BTreeMap<String, DifficultyProfile> {
        let mut profiles = DifficultyProfile::defaults();
        for (name, profile) in &self.difficulties {
            profiles.insert(name.trim().to_ascii_lowercase(), profile.clone());
        }
        profiles
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::with_difficulties(self.difficulty_profiles())
    }

    pub fn validate(&self) -> Result<()> {
        let profiles = self.difficulty_profiles();
        for (name, profile) in &profiles {
            profile
                .validate()
                .map_err(|e| anyhow!("Invalid difficulty '{}': {}", name, e))?;
        }
        let wanted = self.engine.default_difficulty.trim().to_ascii_lowercase();
        if !profiles.contains_key(&wanted) {
            return Err(anyhow!(
                "Default difficulty '{}' is not defined",
                self.engine.default_difficulty
            ));
        }
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir cannot be empty"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("dungeon-rpg.log".to_string()),
            },
            difficulties: DifficultyProfile::defaults(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        config.validate().expect("valid");
        assert_eq!(config.db_path(), "./data/dungeons");
        assert_eq!(config.difficulty_profiles().len(), 3);
    }

    #[test]
    fn minimal_toml_falls_back_to_builtins() {
        let config: Config = toml::from_str("[engine]\nseed = 7\n").expect("parse");
        assert_eq!(config.engine.seed, Some(7));
        assert_eq!(config.engine.default_difficulty, "easy");
        assert!(config.difficulties.is_empty());
        let catalog = config.catalog();
        assert_eq!(catalog.difficulty("hard"), Some(&DifficultyProfile::hard()));
    }

    #[test]
    fn custom_difficulty_is_added() {
        let text = r#"
[difficulties.Nightmare]
min_rooms = 12
max_rooms = 18
min_room_size = 3
max_room_size = 5
enemy_density = 0.09
treasure_density = 0.01
door_chance = 0.9
width = 60
height = 40
"#;
        let config: Config = toml::from_str(text).expect("parse");
        config.validate().expect("valid");
        let catalog = config.catalog();
        assert_eq!(catalog.difficulty("nightmare").map(|p| p.width), Some(60));
        assert!(catalog.difficulty("easy").is_some());
    }

    #[test]
    fn bad_profile_or_default_is_rejected() {
        let mut config = Config::default();
        config.engine.default_difficulty = "legendary".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        let mut broken = DifficultyProfile::easy();
        broken.max_room_size = 40;
        config.difficulties.insert("broken".into(), broken);
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn create_default_then_load() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        let path = path.to_string_lossy().to_string();
        Config::create_default(&path).await.expect("write");
        let loaded = Config::load(&path).await.expect("load");
        assert_eq!(loaded.storage.data_dir, "./data");
        assert_eq!(loaded.difficulties.get("medium"), Some(&DifficultyProfile::medium()));
        assert!(Config::load("/definitely/not/here.toml").await.is_err());
    }
}
