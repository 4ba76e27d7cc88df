// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Bayline store.

use thiserror::Error;

/// The primary error type used across all Bayline adapter traits and core operations.
#[derive(Debug, Error)]
pub enum BaylineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Persistent namespace errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Broadcast channel errors (channel closed, unsupported, post failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A record draft was rejected at the insertion boundary.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Persisted or broadcast payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BaylineError {
    /// Build a [`BaylineError::Channel`] without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        BaylineError::Channel {
            message: message.into(),
            source: None,
        }
    }
}
