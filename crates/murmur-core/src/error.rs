// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for murmur.

use thiserror::Error;

/// The primary error type used across all murmur adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Message pool storage errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (enumeration failure, rejected send, rate limiting).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operator is not allowed to mutate the message pool.
    #[error("permission denied for operator `{operator}`")]
    PermissionDenied { operator: String },

    /// Caller-supplied input was rejected (empty message text, bad id).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MurmurError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        MurmurError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Short machine-friendly name of the variant, used in compact failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            MurmurError::Config(_) => "Config",
            MurmurError::Storage { .. } => "Storage",
            MurmurError::Transport { .. } => "Transport",
            MurmurError::PermissionDenied { .. } => "PermissionDenied",
            MurmurError::InvalidInput(_) => "InvalidInput",
            MurmurError::NotFound { .. } => "NotFound",
            MurmurError::Internal(_) => "Internal",
        }
    }
}
