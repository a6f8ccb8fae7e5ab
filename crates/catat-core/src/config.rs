//! Channel configuration
//!
//! Per-channel auto-commit thresholds and the OCR request ceiling live in a
//! TOML file rather than as literals at call sites.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/catat/config/channels.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::policy::DEFAULT_THRESHOLD;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/channels.toml");

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_ocr_timeout_secs() -> u64 {
    60
}

fn default_vision_attempts() -> u32 {
    2
}

/// Voice channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "default_threshold")]
    pub auto_commit_threshold: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            auto_commit_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// OCR channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Hard wall-clock ceiling per document-processing request
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts for the vision extraction call (transient failures only)
    #[serde(default = "default_vision_attempts")]
    pub vision_attempts: u32,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_ocr_timeout_secs(),
            vision_attempts: default_vision_attempts(),
        }
    }
}

/// WhatsApp channel settings
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default = "default_threshold")]
    pub auto_commit_threshold: f64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            auto_commit_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// All channel settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

impl ChannelConfig {
    /// Load config with override-then-default resolution
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::override_path() {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded channel config override");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Invalid channel config override, using defaults");
                    }
                }
            }
        }
        Self::embedded()
    }

    /// Parse the embedded default config
    pub fn embedded() -> Result<Self> {
        toml::from_str(DEFAULT_CONFIG)
            .map_err(|e| crate::error::Error::ConfigurationMissing(format!("embedded channel config invalid: {}", e)))
    }

    fn override_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("catat").join("config").join("channels.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config = ChannelConfig::embedded().unwrap();
        assert_eq!(config.voice.auto_commit_threshold, 0.7);
        assert_eq!(config.whatsapp.auto_commit_threshold, 0.7);
        assert_eq!(config.ocr.timeout_secs, 60);
        assert_eq!(config.ocr.vision_attempts, 2);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ChannelConfig = toml::from_str("[voice]\nauto_commit_threshold = 0.85\n").unwrap();
        assert_eq!(config.voice.auto_commit_threshold, 0.85);
        assert_eq!(config.ocr.timeout_secs, 60);
        assert_eq!(config.whatsapp.auto_commit_threshold, DEFAULT_THRESHOLD);
    }
}
