// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::MemsiftError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for generating vector embeddings from text.
///
/// Failures surface as [`MemsiftError::Provider`]; callers treat them as
/// "no embedding available" for the affected text.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates embeddings for the given input.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemsiftError>;

    /// Embeds a single text, returning its vector.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MemsiftError> {
        let output = self.embed(EmbeddingInput::single(text)).await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MemsiftError::provider("embedding returned no results"))
    }
}
