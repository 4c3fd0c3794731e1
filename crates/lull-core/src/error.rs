//! Core error types for lull-core.
//!
//! This module defines the error hierarchy for the triage pipeline using
//! thiserror. Failures fall into three families: classification failures
//! (absorbed by the engine's fallback priority), delivery transport
//! failures (surfaced once, never retried), and configuration failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lull-core.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Classification collaborator errors
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// Delivery transport errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid message lifecycle transition
    #[error("State error: {0}")]
    State(#[from] crate::message::StateTransitionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Classification-specific errors.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The classifier endpoint returned a non-success status
    #[error("Classifier API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The classifier reply could not be interpreted
    #[error("Malformed classifier reply: {0}")]
    Malformed(String),

    /// The HTTP request itself failed
    #[error("Classifier request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The classifier is not reachable or not running
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    /// No API key in the environment or the OS keyring
    #[error("Classifier credentials not configured")]
    MissingCredentials,
}

/// Delivery transport errors. The core never retries a failed delivery;
/// these surface to the caller exactly once.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The transport refused the notification
    #[error("Delivery transport rejected '{message_id}': {message}")]
    Rejected { message_id: String, message: String },

    /// The transport is not available at all
    #[error("Delivery transport unavailable: {0}")]
    Unavailable(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Filesystem access failed
    #[error("Configuration IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-separated configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Value cannot be parsed for the key's type
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

// Helper implementations for converting from other error types

impl From<Box<dyn std::error::Error + Send + Sync>> for TriageError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        TriageError::Custom(err.to_string())
    }
}

/// Result type alias for TriageError
pub type Result<T, E = TriageError> = std::result::Result<T, E>;
