//! TaskChat configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::SlotPolicy;

/// Main TaskChat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Generative assist configuration
    pub assist: AssistConfig,

    /// Default slot policy
    pub slots: SlotsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.slots.weekday_hour > 23 || self.slots.weekend_hour > 23 {
            return Err(eyre::eyre!(
                "Slot hours must be 0-23 (weekday: {}, weekend: {})",
                self.slots.weekday_hour,
                self.slots.weekend_hour
            ));
        }
        if self.slots.duration_mins == 0 {
            return Err(eyre::eyre!("Default duration must be at least 1 minute"));
        }
        if self.assist.enabled && self.assist.timeout_secs == 0 {
            return Err(eyre::eyre!("Assist timeout must be at least 1 second"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taskchat.yml
        let local_config = PathBuf::from(".taskchat.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taskchat/taskchat.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taskchat").join("taskchat.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 1024,
            timeout_ms: 30_000,
        }
    }
}

/// Generative assist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Whether to use the generative assist at all
    pub enabled: bool,

    /// Hard wall-clock bound around each model call
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Max tokens per assist reply
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: 10,
            max_tokens: 1024,
        }
    }
}

/// Default slot policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsConfig {
    /// Default presentation hour on weekdays
    #[serde(rename = "weekday-hour")]
    pub weekday_hour: u32,

    /// Default presentation hour on weekends
    #[serde(rename = "weekend-hour")]
    pub weekend_hour: u32,

    /// Default task duration in minutes
    #[serde(rename = "duration-mins")]
    pub duration_mins: i64,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            weekday_hour: 16,
            weekend_hour: 10,
            duration_mins: 60,
        }
    }
}

impl From<&SlotsConfig> for SlotPolicy {
    fn from(config: &SlotsConfig) -> Self {
        Self {
            weekday_hour: config.weekday_hour,
            weekend_hour: config.weekend_hour,
            duration_mins: config.duration_mins,
        }
    }
}
