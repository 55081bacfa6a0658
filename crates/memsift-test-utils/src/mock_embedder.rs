// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding provider for deterministic testing.
//!
//! By default each lowercase word of the text is hashed into one of
//! `dimensions` buckets, so texts sharing words get similar vectors. Exact
//! vectors and failures can be scripted per text.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use memsift_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, MemsiftError,
    PluginAdapter,
};
use memsift_memory::embedder::hash_tokens;

/// Default dimensionality of hashed embeddings.
pub const DEFAULT_MOCK_DIMENSIONS: usize = 16;

/// A mock embedder with scripted vectors and failures.
pub struct MockEmbedder {
    dimensions: usize,
    scripted: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    fail_all: bool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_MOCK_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            scripted: HashMap::new(),
            failing: HashSet::new(),
            fail_all: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return exactly `vector` for `text`.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.scripted.insert(text.into(), vector);
        self
    }

    /// Fail with a provider error whenever `text` is embedded.
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Fail every request, as an unreachable provider would.
    pub fn unavailable() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    /// Number of texts embedded (or attempted) so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>, MemsiftError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || self.failing.contains(text) {
            return Err(MemsiftError::provider(format!("mock embedding failure for `{text}`")));
        }
        if let Some(vector) = self.scripted.get(text) {
            return Ok(vector.clone());
        }
        Ok(hashed_embedding(text, self.dimensions))
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bag-of-words embedding: one hashed bucket per lowercase word.
pub fn hashed_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    hash_tokens(words.iter().map(String::as_str), dimensions)
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemsiftError> {
        if self.fail_all {
            Ok(HealthStatus::Unhealthy("mock provider unavailable".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemsiftError> {
        let embeddings = input
            .texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect::<Result<Vec<_>, _>>()?;
        let dimensions = embeddings.first().map_or(self.dimensions, Vec::len);
        Ok(EmbeddingOutput {
            embeddings,
            dimensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashed_embeddings_are_deterministic() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed_one("User likes hiking").await.unwrap();
        let b = embedder.embed_one("user LIKES hiking").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_MOCK_DIMENSIONS);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn scripted_vectors_and_failures() {
        let embedder = MockEmbedder::new()
            .with_vector("tea", vec![1.0, 0.0])
            .failing_on("broken");
        assert_eq!(embedder.embed_one("tea").await.unwrap(), vec![1.0, 0.0]);
        assert!(matches!(
            embedder.embed_one("broken").await,
            Err(MemsiftError::Provider { .. })
        ));
    }

    #[tokio::test]
    async fn unavailable_provider_fails_everything() {
        let embedder = MockEmbedder::unavailable();
        assert!(embedder.embed_one("anything").await.is_err());
        assert!(matches!(
            embedder.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
