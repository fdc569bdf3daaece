use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub export: ExportConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Answer window per question, in seconds.
    pub answer_seconds: u32,
    /// Pause shown between questions, in seconds. Not applied before the
    /// first question.
    pub interlude_seconds: u64,
    /// Whether the speaker check must be confirmed before the interview
    /// can start.
    pub require_speaker_check: bool,
    /// Cadence at which recorders deliver media chunks, in milliseconds.
    pub chunk_interval_ms: u64,
    /// Path of the clip played by the speaker test.
    pub speaker_clip: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            answer_seconds: 60,
            interlude_seconds: 2,
            require_speaker_check: true,
            chunk_interval_ms: 1000,
            speaker_clip: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write each finalized answer's media blobs to disk, named by question
    /// number.
    pub enabled: bool,
    /// Override for the export directory. Defaults to the data dir.
    pub dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3747 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.answer_seconds, 60);
        assert_eq!(config.interlude_seconds, 2);
        assert!(config.require_speaker_check);
        assert_eq!(config.chunk_interval_ms, 1000);
    }

    #[test]
    fn test_config_parses_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [session]
            answer_seconds = 90
            require_speaker_check = false
            "#,
        )
        .unwrap();

        assert_eq!(config.session.answer_seconds, 90);
        assert!(!config.session.require_speaker_check);
        // Unspecified sections fall back to defaults
        assert_eq!(config.session.interlude_seconds, 2);
        assert!(!config.export.enabled);
        assert_eq!(config.server.port, 3747);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.export.enabled = true;
        config.server.port = 4000;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert!(parsed.export.enabled);
        assert_eq!(parsed.server.port, 4000);
    }
}
