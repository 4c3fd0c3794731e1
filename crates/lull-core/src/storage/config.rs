//! TOML-based application configuration.
//!
//! Stores the tunable pieces of the triage pipeline:
//! - Delay constants (hold durations, the digest hour)
//! - Classifier endpoint and model
//!
//! Configuration is stored at `~/.config/lull/config.toml`. Missing files
//! and missing keys fall back to defaults, so a fresh install works with
//! no configuration at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::delay::DelayRules;
use crate::error::ConfigError;

/// Classifier endpoint configuration.
///
/// The API key is deliberately not part of the file; it lives in the OS
/// keyring or the LULL_API_KEY environment variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model name sent with each request
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lull/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub delays: DelayRules,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key
    /// (e.g. "delays.working_hold_min", "classifier.model").
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.pointer(&json_pointer(key))? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The value is coerced to
    /// the key's existing type. Does not persist; call [`Config::save`]
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be
    /// parsed for the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let slot = json
            .pointer_mut(&json_pointer(key))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        if slot.is_object() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }
        *slot = coerce_value(slot, key, value)?;

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

fn json_pointer(key: &str) -> String {
    format!("/{}", key.replace('.', "/"))
}

/// Parse `value` into the JSON type the slot currently holds.
fn coerce_value(
    existing: &serde_json::Value,
    key: &str,
    value: &str,
) -> Result<serde_json::Value, ConfigError> {
    match existing {
        serde_json::Value::Bool(_) => {
            value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })
        }
        serde_json::Value::Number(_) => {
            if let Ok(n) = value.parse::<i64>() {
                Ok(serde_json::Value::Number(n.into()))
            } else if let Ok(f) = value.parse::<f64>() {
                serde_json::Number::from_f64(f)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("cannot parse '{value}' as number"),
                    })
            } else {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as number"),
                })
            }
        }
        _ => Ok(serde_json::Value::String(value.to_string())),
    }
}
