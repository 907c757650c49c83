//! Runtime configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Top-level configuration. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
pub struct OthelloConfig {
    /// Search depth limits.
    #[serde(default)]
    search: SearchConfig,

    /// Commentary provider settings.
    #[serde(default)]
    commentary: CommentaryConfig,

    /// Snapshot fan-out settings.
    #[serde(default)]
    broadcast: BroadcastConfig,
}

/// Search depth limits for the automated opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize, derive_new::new)]
pub struct SearchConfig {
    /// Depth used when a request names none.
    #[serde(default = "default_depth")]
    default_depth: u32,

    /// Largest depth a request may ask for.
    #[serde(default = "default_max_depth")]
    max_depth: u32,
}

/// Commentary provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct CommentaryConfig {
    /// Whether the gate may open at all.
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Chat-completions endpoint.
    #[serde(default = "default_api_url")]
    api_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    api_key_env: String,

    /// Maximum tokens for a comment.
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,

    /// Seed for the gate's RNG; entropy when absent.
    #[serde(default)]
    seed: Option<u64>,
}

/// Snapshot fan-out settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Unread updates buffered per subscriber.
    #[serde(default = "default_capacity")]
    capacity: usize,
}

fn default_depth() -> u32 {
    4
}

fn default_max_depth() -> u32 {
    8
}

fn default_enabled() -> bool {
    true
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_capacity() -> usize {
    64
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new(default_depth(), default_max_depth())
    }
}

impl Default for CommentaryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_url: default_api_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            seed: None,
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl SearchConfig {
    /// Checks `1 <= default_depth <= max_depth`.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_depth == 0 || self.default_depth > self.max_depth {
            return Err(ConfigError::new(format!(
                "search.default_depth {} must lie in 1..={}",
                self.default_depth, self.max_depth
            )));
        }
        Ok(())
    }
}

impl OthelloConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.search.validate()?;

        info!(
            default_depth = config.search.default_depth,
            commentary = config.commentary.enabled,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
