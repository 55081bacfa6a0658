// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthetic corpora with controlled similarity structure.
//!
//! Every vector lives in a space with one shared axis, one axis per theme and
//! one private axis per memory:
//!
//! ```text
//! base(g)      = sqrt(inter) * shared + sqrt(1 - inter) * theme(g)
//! member(g, i) = sqrt(intra) * base(g) + sqrt(1 - intra) * private(g, i)
//! ```
//!
//! so two members of one theme have cosine `intra`, members of different
//! themes have cosine `intra * inter`, and isolated memories (private axis
//! only) are orthogonal to everything.

use chrono::{DateTime, Duration, Utc};

use memsift_memory::MemoryRecord;

/// Unit vector along axis `index` of a `dimensions`-dimensional space.
pub fn unit_axis(dimensions: usize, index: usize) -> Vec<f32> {
    let mut v = vec![0.0; dimensions];
    v[index] = 1.0;
    v
}

/// Record with an embedding, created `age_days` before `now`.
pub fn memory_aged(
    id: &str,
    fact: &str,
    embedding: Vec<f32>,
    now: DateTime<Utc>,
    age_days: i64,
) -> MemoryRecord {
    MemoryRecord::new(id, fact, now - Duration::days(age_days)).with_embedding(embedding)
}

/// Builder for a corpus of themed groups plus isolated memories.
///
/// Ids are `g{group}-m{member}` and `iso-{n}`; theme members share the word
/// `theme{group}` in their fact text.
#[derive(Debug, Clone)]
pub struct ThemedCorpus {
    groups: Vec<usize>,
    isolated: usize,
    intra: f64,
    inter: f64,
    now: DateTime<Utc>,
    age_days: i64,
}

impl ThemedCorpus {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            groups: Vec::new(),
            isolated: 0,
            intra: 0.9,
            inter: 0.1,
            now,
            age_days: 0,
        }
    }

    /// Add a theme with `size` members.
    pub fn group(mut self, size: usize) -> Self {
        self.groups.push(size);
        self
    }

    pub fn isolated(mut self, count: usize) -> Self {
        self.isolated = count;
        self
    }

    /// Cosine between two members of the same theme.
    pub fn intra(mut self, cosine: f64) -> Self {
        self.intra = cosine;
        self
    }

    /// Cosine between two theme bases.
    pub fn inter(mut self, cosine: f64) -> Self {
        self.inter = cosine;
        self
    }

    /// Age of every generated memory.
    pub fn aged(mut self, days: i64) -> Self {
        self.age_days = days;
        self
    }

    pub fn len(&self) -> usize {
        self.groups.iter().sum::<usize>() + self.isolated
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of the generated vectors.
    pub fn dimensions(&self) -> usize {
        1 + self.groups.len() + self.len()
    }

    /// Generate the records: themes in order, then the isolated memories.
    pub fn build(&self) -> Vec<MemoryRecord> {
        let dims = self.dimensions();
        let themes = self.groups.len();
        let mut private_axis = 1 + themes;
        let mut records = Vec::with_capacity(self.len());

        for (g, &size) in self.groups.iter().enumerate() {
            let base: Vec<f64> = (0..dims)
                .map(|d| match d {
                    0 => self.inter.sqrt(),
                    d if d == 1 + g => (1.0 - self.inter).sqrt(),
                    _ => 0.0,
                })
                .collect();

            for i in 0..size {
                let mut v: Vec<f64> = base.iter().map(|x| x * self.intra.sqrt()).collect();
                v[private_axis] = (1.0 - self.intra).sqrt();
                private_axis += 1;
                records.push(memory_aged(
                    &format!("g{g}-m{i}"),
                    &format!("theme{g} detail{g}x{i}"),
                    v.into_iter().map(|x| x as f32).collect(),
                    self.now,
                    self.age_days,
                ));
            }
        }

        for n in 0..self.isolated {
            records.push(memory_aged(
                &format!("iso-{n}"),
                &format!("isolated remark{n}"),
                unit_axis(dims, private_axis),
                self.now,
                self.age_days,
            ));
            private_axis += 1;
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use memsift_memory::cosine_similarity;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn cosines_follow_the_requested_structure() {
        let records = ThemedCorpus::new(now()).group(3).group(2).isolated(1).build();
        assert_eq!(records.len(), 6);
        let e = |i: usize| records[i].embedding.clone().unwrap();

        assert!((cosine_similarity(&e(0), &e(1)) - 0.9).abs() < 1e-5);
        assert!((cosine_similarity(&e(3), &e(4)) - 0.9).abs() < 1e-5);
        assert!((cosine_similarity(&e(0), &e(3)) - 0.09).abs() < 1e-5);
        assert!(cosine_similarity(&e(0), &e(5)).abs() < 1e-9);
        assert!((cosine_similarity(&e(2), &e(2)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ids_and_ages() {
        let records = ThemedCorpus::new(now()).group(2).isolated(1).aged(40).build();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["g0-m0", "g0-m1", "iso-0"]);
        assert!(records.iter().all(|r| r.created_at == now() - Duration::days(40)));
    }
}
