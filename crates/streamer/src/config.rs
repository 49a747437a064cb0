//! Streamer configuration management

use crate::usb::worker::{DEFAULT_FRAME_RATE_HZ, TransportConfig};
use anyhow::{Context, Result, anyhow};
use common::PatternKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest frame rate accepted from configuration
pub const MAX_FRAME_RATE_HZ: u32 = 240;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamerConfig {
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub pattern: PatternSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "LoggingSettings::default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

impl LoggingSettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

/// Transport timing
///
/// The panel is driven at a fixed rate; this is read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "DisplaySettings::default_frame_rate")]
    pub frame_rate_hz: u32,
    /// Timeout for each bulk transfer in milliseconds
    #[serde(default = "DisplaySettings::default_transfer_timeout")]
    pub transfer_timeout_ms: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            frame_rate_hz: Self::default_frame_rate(),
            transfer_timeout_ms: Self::default_transfer_timeout(),
        }
    }
}

impl DisplaySettings {
    fn default_frame_rate() -> u32 {
        DEFAULT_FRAME_RATE_HZ
    }

    fn default_transfer_timeout() -> u64 {
        1000
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            frame_rate_hz: self.frame_rate_hz,
            transfer_timeout: Duration::from_millis(self.transfer_timeout_ms),
        }
    }
}

/// Built-in test pattern used when no host feeds images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSettings {
    #[serde(default)]
    pub kind: PatternKind,
    /// Pixels scrolled per frame
    #[serde(default = "PatternSettings::default_speed")]
    pub speed: usize,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            kind: PatternKind::default(),
            speed: Self::default_speed(),
        }
    }
}

impl PatternSettings {
    fn default_speed() -> usize {
        4
    }
}

impl StreamerConfig {
    /// Load configuration from `path`, or from the first standard location that exists
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let candidates = vec![
                Self::default_path(),
                PathBuf::from("/etc/push-display/streamer.toml"),
            ];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: StreamerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("push-display").join("streamer.toml")
        } else {
            PathBuf::from(".config/push-display/streamer.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        if !(1..=MAX_FRAME_RATE_HZ).contains(&self.display.frame_rate_hz) {
            return Err(anyhow!(
                "Invalid frame rate {} Hz, must be between 1 and {}",
                self.display.frame_rate_hz,
                MAX_FRAME_RATE_HZ
            ));
        }

        if self.display.transfer_timeout_ms == 0 {
            return Err(anyhow!("Transfer timeout must be greater than 0"));
        }

        Ok(())
    }
}
