use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;
use super::protocol::VolumeStream;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Explicit adb binary. Empty means discover it (see `platform::find_adb_binary`).
    #[serde(default)]
    pub adb_path: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Quiet period before a slider change is sent to the device.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub default_stream: VolumeStream,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// One-line file holding the remembered device address.
    #[serde(default = "default_remembered_address")]
    pub remembered_address: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            adb_path: String::new(),
            port: default_port(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            default_stream: VolumeStream::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            remembered_address: default_remembered_address(),
        }
    }
}

fn default_port() -> u16 {
    platform::ADB_TCP_PORT
}

fn default_command_timeout_secs() -> u64 {
    10
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_remembered_address() -> PathBuf {
    platform::config_dir().join("autoconnect.txt")
}

impl BridgeConfig {
    /// Resolve the adb binary: config value, then discovery, then bare `adb`.
    pub fn adb_binary(&self) -> PathBuf {
        if !self.adb_path.trim().is_empty() {
            return PathBuf::from(self.adb_path.trim());
        }
        platform::find_adb_binary().unwrap_or_else(|| PathBuf::from("adb"))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

impl VolumeConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
