// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Size refinement of coarse clusters.
//!
//! Per coarse group of size `s`:
//!
//! - `s == 1` goes to outliers.
//! - `1 < s <= max` is kept as a cluster, including groups below `min`.
//! - `s > max` is split round-robin into `ceil(s / max)` subgroups; a subgroup
//!   smaller than `min`, or of a single item, goes to outliers.
//!
//! No refined cluster ever holds exactly one memory, so with `min == 1` the
//! effective lower bound is still 2.
//!
//! The split ignores similarity on purpose: member `k` of the group lands in
//! subgroup `k % subgroups`.

use memsift_core::MemsiftError;

use crate::clusterer::CoarseLabels;

/// Target cluster size range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    min: usize,
    max: usize,
}

impl SizeRange {
    /// Requires `1 <= min <= max`. `min == 1` is accepted but behaves like 2,
    /// since single-item groups always become outliers.
    pub fn new(min: usize, max: usize) -> Result<Self, MemsiftError> {
        if min == 0 || min > max {
            return Err(MemsiftError::Config(format!(
                "invalid cluster size range ({min}, {max}): need 1 <= min <= max"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self { min: 5, max: 10 }
    }
}

/// Final groups of item indices after refinement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefinedGroups {
    /// Thematic clusters, in coarse label order then subgroup order.
    pub clusters: Vec<Vec<usize>>,
    /// All outlier items across groups, in ascending index (corpus) order.
    pub outliers: Vec<usize>,
}

/// Enforce `range` on the coarse grouping.
pub fn refine(coarse: &CoarseLabels, range: SizeRange) -> RefinedGroups {
    let mut refined = RefinedGroups::default();

    for group in coarse.groups() {
        let size = group.len();
        if size == 0 {
            continue;
        }
        if size == 1 {
            refined.outliers.extend(group);
        } else if size <= range.max {
            refined.clusters.push(group);
        } else {
            for subgroup in split_round_robin(&group, size.div_ceil(range.max)) {
                if subgroup.len() >= range.min.max(2) {
                    refined.clusters.push(subgroup);
                } else {
                    refined.outliers.extend(subgroup);
                }
            }
        }
    }

    refined.outliers.sort_unstable();
    refined
}

fn split_round_robin(group: &[usize], parts: usize) -> Vec<Vec<usize>> {
    let mut subgroups = vec![Vec::new(); parts];
    for (position, &item) in group.iter().enumerate() {
        subgroups[position % parts].push(item);
    }
    subgroups
}
