// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid similarity between a candidate and a growing group of items.
//!
//! ```text
//! emb   = mean(cosine(candidate, member))            over members
//! boost = mean(jaccard(tokens(candidate), tokens(member))) * keyword_boost
//! score = clamp(emb + boost, 0, 1)
//! ```
//!
//! The keyword term is added on top of embedding similarity, not blended
//! with it; only the final clamp bounds the sum.

use std::collections::HashSet;

use crate::tokenizer::{jaccard, Tokenizer};
use crate::vector::cosine_similarity;

/// Default multiplier for the keyword overlap term.
pub const DEFAULT_KEYWORD_BOOST: f64 = 0.2;

/// An item prepared for scoring: its embedding and keyword set.
#[derive(Debug, Clone)]
pub struct ScoringInput<'a> {
    pub embedding: &'a [f32],
    pub tokens: HashSet<String>,
}

impl<'a> ScoringInput<'a> {
    pub fn new(embedding: &'a [f32], text: &str, tokenizer: &Tokenizer) -> Self {
        Self {
            embedding,
            tokens: tokenizer.tokenize(text),
        }
    }
}

/// Combines embedding cosine and keyword Jaccard into one score.
#[derive(Debug, Clone, Copy)]
pub struct HybridScorer {
    keyword_boost: f64,
}

impl HybridScorer {
    pub fn new(keyword_boost: f64) -> Self {
        Self { keyword_boost }
    }

    pub fn keyword_boost(&self) -> f64 {
        self.keyword_boost
    }

    /// Score `candidate` against every item of `group`.
    ///
    /// An empty group scores `0.0`.
    pub fn score<'g, 'e: 'g, I>(&self, candidate: &ScoringInput<'_>, group: I) -> f64
    where
        I: IntoIterator<Item = &'g ScoringInput<'e>>,
    {
        let mut emb_sum = 0.0;
        let mut kw_sum = 0.0;
        let mut count = 0usize;
        for member in group {
            emb_sum += cosine_similarity(candidate.embedding, member.embedding);
            kw_sum += jaccard(&candidate.tokens, &member.tokens);
            count += 1;
        }

        if count == 0 {
            return 0.0;
        }

        let n = count as f64;
        let emb_sim = emb_sum / n;
        let kw_boost = (kw_sum / n) * self.keyword_boost;
        (emb_sim + kw_boost).clamp(0.0, 1.0)
    }

    /// Score item `candidate` of `items` against the items at `members`.
    pub fn score_indexed(
        &self,
        items: &[ScoringInput<'_>],
        candidate: usize,
        members: &[usize],
    ) -> f64 {
        self.score(&items[candidate], members.iter().map(|&m| &items[m]))
    }
}

impl Default for HybridScorer {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_BOOST)
    }
}
