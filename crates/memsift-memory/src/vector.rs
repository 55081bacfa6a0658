// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector similarity, centroids and the at-rest embedding format.
//!
//! Embeddings are stored as an ordered, comma-separated list of decimals.
//! Arithmetic accumulates in `f64` so long vectors keep their precision.

use memsift_core::MemsiftError;

/// Cosine similarity between two vectors of equal dimensionality.
///
/// Returns `0.0` when either vector has zero norm. The result is clamped to
/// `[-1, 1]` to absorb rounding drift.
///
/// # Panics
///
/// Panics if the vectors differ in length. Use [`try_cosine_similarity`]
/// where mismatched input is expected.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Cosine similarity that reports mismatched dimensionality as an error.
pub fn try_cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, MemsiftError> {
    if a.len() != b.len() {
        return Err(MemsiftError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(cosine_similarity(a, b))
}

/// Elementwise arithmetic mean. Empty input yields an empty vector.
///
/// # Panics
///
/// Panics if the vectors differ in length.
pub fn centroid<V: AsRef<[f32]>>(vectors: &[V]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };

    let dim = first.as_ref().len();
    let mut sum = vec![0.0f64; dim];
    for vector in vectors {
        let vector = vector.as_ref();
        assert_eq!(vector.len(), dim, "vectors must have same length");
        for (acc, v) in sum.iter_mut().zip(vector) {
            *acc += f64::from(*v);
        }
    }

    let count = vectors.len() as f64;
    sum.into_iter().map(|s| (s / count) as f32).collect()
}

/// Serialize an embedding into its comma-separated at-rest form.
///
/// Uses the shortest decimal that round-trips each `f32` exactly.
pub fn serialize_embedding(embedding: &[f32]) -> String {
    embedding
        .iter()
        .map(f32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse the comma-separated at-rest form back into a vector.
///
/// Empty strings, empty components, unparsable numbers and non-finite
/// values are rejected.
pub fn parse_embedding(raw: &str) -> Result<Vec<f32>, MemsiftError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MemsiftError::EmbeddingParse {
            reason: "empty embedding".to_string(),
        });
    }

    raw.split(',')
        .enumerate()
        .map(|(index, part)| {
            let part = part.trim();
            let value: f32 = part.parse().map_err(|_| MemsiftError::EmbeddingParse {
                reason: format!("component {index} `{part}` is not a number"),
            })?;
            if !value.is_finite() {
                return Err(MemsiftError::EmbeddingParse {
                    reason: format!("component {index} is not finite"),
                });
            }
            Ok(value)
        })
        .collect()
}
