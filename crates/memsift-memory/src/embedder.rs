// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local feature-hashing embedding adapter.
//!
//! Each keyword the [`Tokenizer`] keeps is hashed into one of a fixed number
//! of buckets and the bucket counts are L2-normalized. Texts sharing keywords
//! get similar vectors. No model files and no network access.

use std::sync::Arc;

use async_trait::async_trait;

use memsift_core::{
    AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, HealthStatus, MemsiftError,
    PluginAdapter,
};

use crate::tokenizer::Tokenizer;

/// Default dimensionality of hashed embeddings.
pub const HASHING_DIM: usize = 256;

/// Embedding adapter backed by keyword feature hashing.
pub struct HashingEmbedder {
    tokenizer: Arc<Tokenizer>,
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(tokenizer: Arc<Tokenizer>, dimensions: usize) -> Result<Self, MemsiftError> {
        if dimensions == 0 {
            return Err(MemsiftError::Config(
                "hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self {
            tokenizer,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text. A text without keywords maps to the zero vector.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut tokens: Vec<String> = self.tokenizer.tokenize(text).into_iter().collect();
        tokens.sort_unstable();
        l2_normalize(&hash_tokens(tokens.iter().map(String::as_str), self.dimensions))
    }
}

/// Bucket counts of FNV-1a hashed tokens.
pub fn hash_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>, dimensions: usize) -> Vec<f32> {
    let mut buckets = vec![0.0f32; dimensions.max(1)];
    let len = buckets.len() as u64;
    for token in tokens {
        buckets[(fnv1a(token) % len) as usize] += 1.0;
    }
    buckets
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// L2-normalize a vector.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[async_trait]
impl PluginAdapter for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MemsiftError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for HashingEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MemsiftError> {
        let embeddings = input.texts.iter().map(|text| self.embed_text(text)).collect();
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimensions,
        })
    }
}
