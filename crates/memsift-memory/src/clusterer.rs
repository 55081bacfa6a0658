// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coarse greedy clustering.
//!
//! A single ordered pass: each unassigned item seeds a new cluster, then every
//! later unassigned item joins if its hybrid score against the cluster *as it
//! has grown so far* reaches the threshold. Input order matters; reordering the
//! corpus can change membership.

use crate::similarity::{HybridScorer, ScoringInput};

/// Default minimum hybrid score for joining a growing cluster.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.60;

/// Provisional cluster label per input item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoarseLabels {
    /// `labels[i]` is the coarse cluster of item `i`.
    pub labels: Vec<usize>,
    /// Number of distinct labels, which are `0..cluster_count`.
    pub cluster_count: usize,
}

impl CoarseLabels {
    /// Item indices per label, each group in input order.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count];
        for (index, &label) in self.labels.iter().enumerate() {
            groups[label].push(index);
        }
        groups
    }
}

/// Partition `items` into coarse clusters.
///
/// `on_seed(done, total)` fires after each seed finishes its scan, with the
/// number of items assigned so far.
pub fn coarse_cluster(
    items: &[ScoringInput<'_>],
    scorer: &HybridScorer,
    threshold: f64,
    mut on_seed: impl FnMut(usize, usize),
) -> CoarseLabels {
    let n = items.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut cluster_id = 0;
    let mut assigned = 0;

    for i in 0..n {
        if labels[i].is_some() {
            continue;
        }
        labels[i] = Some(cluster_id);
        let mut members = vec![i];

        for j in (i + 1)..n {
            if labels[j].is_some() {
                continue;
            }
            if scorer.score_indexed(items, j, &members) >= threshold {
                labels[j] = Some(cluster_id);
                members.push(j);
            }
        }

        assigned += members.len();
        cluster_id += 1;
        on_seed(assigned, n);
    }

    CoarseLabels {
        // Every index was visited by the outer loop, so all labels are set.
        labels: labels.into_iter().map(|l| l.unwrap_or_default()).collect(),
        cluster_count: cluster_id,
    }
}
