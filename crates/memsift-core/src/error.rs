// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for memsift.

use thiserror::Error;

/// The primary error type used across all memsift adapter traits and core operations.
#[derive(Debug, Error)]
pub enum MemsiftError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Embedding provider errors (model failure, remote API failure).
    ///
    /// Callers treat this as "no embedding available", never as fatal to a
    /// whole pipeline run.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The corpus handed to a clustering run is empty.
    #[error("No memories found")]
    EmptyCorpus,

    /// At least one memory in a clustering run has no usable embedding.
    #[error("Missing embeddings for {count} memories; backfill embeddings before clustering")]
    MissingEmbeddings { count: usize },

    /// A serialized embedding could not be parsed.
    #[error("unreadable embedding: {reason}")]
    EmbeddingParse { reason: String },

    /// Two vectors that must share dimensionality do not.
    #[error("embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemsiftError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        MemsiftError::Provider {
            message: message.into(),
            source: None,
        }
    }
}
