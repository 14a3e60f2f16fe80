//! Configuration management for voxbar.
//!
//! This module provides core configuration that doesn't depend on
//! platform-specific UI libraries.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::APP_NAME;

/// Default capture and streaming sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Core configuration structure for the application.
///
/// This contains settings that are platform-agnostic. Frontend-specific
/// settings like key bindings are handled separately by the host application.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// AssemblyAI API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assemblyai_key: Option<String>,

    /// Override for the realtime transcription endpoint (base URL, no query)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Sample rate the audio is streamed at (in Hz)
    #[serde(
        default = "default_sample_rate",
        skip_serializing_if = "is_default_sample_rate"
    )]
    pub sample_rate: u32,

    /// Maximum recording duration before auto-stop (in seconds)
    #[serde(
        default = "default_max_record_secs",
        skip_serializing_if = "is_default_max_record_secs"
    )]
    pub max_record_secs: u64,

    /// How long to wait for trailing transcripts after stopping (in seconds)
    #[serde(
        default = "default_finalize_grace_secs",
        skip_serializing_if = "is_default_finalize_grace_secs"
    )]
    pub finalize_grace_secs: u64,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn is_default_sample_rate(v: &u32) -> bool {
    *v == DEFAULT_SAMPLE_RATE
}

fn default_max_record_secs() -> u64 {
    60
}

fn is_default_max_record_secs(v: &u64) -> bool {
    *v == 60
}

fn default_finalize_grace_secs() -> u64 {
    10
}

fn is_default_finalize_grace_secs(v: &u64) -> bool {
    *v == 10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assemblyai_key: None,
            endpoint: None,
            sample_rate: default_sample_rate(),
            max_record_secs: default_max_record_secs(),
            finalize_grace_secs: default_finalize_grace_secs(),
        }
    }
}

impl Config {
    /// Get the AssemblyAI API key
    pub fn key_assemblyai(&self) -> Option<&str> {
        self.assemblyai_key.as_deref()
    }

    /// Get the endpoint override, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Get the streaming sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the maximum recording duration as a Duration
    pub fn max_record_duration(&self) -> Duration {
        Duration::from_secs(self.max_record_secs)
    }

    /// Get the finalize grace period as a Duration
    pub fn finalize_grace(&self) -> Duration {
        Duration::from_secs(self.finalize_grace_secs)
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    #[cfg(test)]
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
        Ok(config_dir.join(APP_NAME).join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;

        if config.key_assemblyai().is_none() {
            warn!(
                "AssemblyAI API key is not set. Transcription will not work without it. \
                 Set `assemblyai_key` in the config file."
            );
        }

        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.assemblyai_key.is_none());
        assert!(config.endpoint.is_none());
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.max_record_secs, 60);
        assert_eq!(config.finalize_grace_secs, 10);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            assemblyai_key: Some("test-key".to_string()),
            endpoint: Some("ws://localhost:9090/v2/realtime/ws".to_string()),
            ..Default::default()
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.assemblyai_key, deserialized.assemblyai_key);
        assert_eq!(config.endpoint, deserialized.endpoint);
    }

    #[test]
    fn test_defaults_not_serialized() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(serialized.trim().is_empty());
    }

    #[test]
    fn test_config_manager_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();

        let manager = ConfigManager::with_config_dir(temp_dir.path());

        let config = Config {
            assemblyai_key: Some("test-key".to_string()),
            max_record_secs: 90,
            ..Default::default()
        };

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(config.assemblyai_key, loaded.assemblyai_key);
        assert_eq!(loaded.max_record_secs, 90);
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();

        let manager = ConfigManager::with_config_dir(temp_dir.path());
        let loaded = manager.load().unwrap();

        assert!(loaded.assemblyai_key.is_none());
        assert_eq!(loaded.sample_rate, DEFAULT_SAMPLE_RATE);
    }
}
