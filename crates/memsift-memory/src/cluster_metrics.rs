// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cohesion, spread, age and review priority of a cluster.

use crate::types::{Cluster, MemoryWithAge};
use crate::vector::{centroid, cosine_similarity};

/// Age at which a cluster counts as fully stale.
pub const STALE_AFTER_DAYS: f64 = 90.0;

/// Mean cosine of each vector to the centroid of all of them.
pub fn density<V: AsRef<[f32]>>(vectors: &[V]) -> f64 {
    if vectors.is_empty() {
        return 0.0;
    }
    let center = centroid(vectors);
    let total: f64 = vectors
        .iter()
        .map(|v| cosine_similarity(v.as_ref(), &center))
        .sum();
    total / vectors.len() as f64
}

/// One minus the mean pairwise cosine; zero for fewer than two vectors.
///
/// Clamped to `[0, 2]`: values above 1 mean members point in opposing
/// directions on average.
pub fn diversity<V: AsRef<[f32]>>(vectors: &[V]) -> f64 {
    let n = vectors.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            total += cosine_similarity(vectors[i].as_ref(), vectors[j].as_ref());
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    (1.0 - total / pairs).clamp(0.0, 2.0)
}

/// Rounded mean of the ages, zero for no ages.
pub fn average_age_days(ages: &[i64]) -> i64 {
    if ages.is_empty() {
        return 0;
    }
    let sum: i64 = ages.iter().sum();
    (sum as f64 / ages.len() as f64).round() as i64
}

/// Review priority in `[0, 1]`.
///
/// Old sparse clusters rank high as pruning candidates; young dense ones rank
/// high as duplicate-review candidates.
pub fn priority_score(avg_age_days: i64, density: f64) -> f64 {
    let age_factor = (avg_age_days as f64 / STALE_AFTER_DAYS).min(1.0);
    let sparsity = 1.0 - density;
    (age_factor * sparsity * 0.6 + (1.0 - age_factor) * density * 0.4).clamp(0.0, 1.0)
}

/// Assemble a cluster and compute all of its statistics.
pub fn build_cluster(id: i64, members: Vec<MemoryWithAge>) -> Cluster {
    let vectors: Vec<&[f32]> = members.iter().map(|m| m.embedding.as_slice()).collect();
    let ages: Vec<i64> = members.iter().map(|m| m.age_days).collect();

    let density = density(&vectors);
    let diversity = diversity(&vectors);
    let avg_age_days = average_age_days(&ages);
    let priority_score = priority_score(avg_age_days, density);

    Cluster {
        id,
        members,
        density,
        avg_age_days,
        diversity,
        priority_score,
    }
}
