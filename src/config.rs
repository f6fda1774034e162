//! Application configuration management.
//!
//! Holds the external player command and the last used username.
//! Stored at `~/.config/pitwall/config.json`; a missing file yields defaults.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "pitwall";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Player used when the config does not name one
pub const DEFAULT_PLAYER: &str = "mpv";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub player_command: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn player_command(&self) -> &str {
        self.player_command.as_deref().unwrap_or(DEFAULT_PLAYER)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
