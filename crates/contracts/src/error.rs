//! Layered error definitions
//!
//! Categorized by source: config / naming / control plane / timer

use thiserror::Error;

use crate::DataType;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Naming Errors =====
    /// Sensor name violates the naming contract
    #[error("invalid sensor name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    // ===== Control Plane Errors =====
    /// Resource already exists
    #[error("resource '{path}' already exists")]
    ResourceExists { path: String },

    /// Resource not found
    #[error("resource '{path}' not found")]
    ResourceNotFound { path: String },

    /// Value or handler type does not match the resource
    #[error("type mismatch on '{path}': resource is {expected:?}, got {actual:?}")]
    TypeMismatch {
        path: String,
        expected: DataType,
        actual: DataType,
    },

    /// Handler token is unknown (already removed)
    #[error("push handler {token} not registered")]
    HandlerNotFound { token: u64 },

    /// Structured value is not a valid document
    #[error("invalid json on '{path}': {message}")]
    InvalidJson { path: String, message: String },

    /// Control plane refused the request
    #[error("control plane rejected request on '{path}': {message}")]
    Rejected { path: String, message: String },

    // ===== Timer Errors =====
    /// Timer service failure
    #[error("timer '{name}' error: {message}")]
    Timer { name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid name error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create control plane rejection error
    pub fn rejected(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create timer error
    pub fn timer(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timer {
            name: name.into(),
            message: message.into(),
        }
    }
}
