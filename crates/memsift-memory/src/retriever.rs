// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query-time semantic retrieval.
//!
//! Candidates are ranked by cosine similarity to the query embedding and the
//! top `k` are returned. Equal scores keep the candidates' original order.
//! Retrieval is advisory: candidates without a usable vector are skipped, and
//! any failure in [`SemanticRetriever`] degrades to an empty result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use memsift_config::model::RetrievalConfig;
use memsift_core::{Clock, EmbeddingAdapter};

use crate::recording;
use crate::store::MemoryCorpus;
use crate::types::{age_in_days, DocumentChunk, MemoryRecord, Scored, ScoredMemory};
use crate::vector::try_cosine_similarity;

/// Anything that can be ranked against a query embedding.
pub trait Retrievable {
    fn embedding(&self) -> Option<&[f32]>;
    fn created_at(&self) -> DateTime<Utc>;
    /// Identifier used in log messages.
    fn retrieval_id(&self) -> &str;
}

impl Retrievable for MemoryRecord {
    fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn retrieval_id(&self) -> &str {
        &self.id
    }
}

impl Retrievable for DocumentChunk {
    fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn retrieval_id(&self) -> &str {
        &self.id
    }
}

impl<T: Retrievable + ?Sized> Retrievable for &T {
    fn embedding(&self) -> Option<&[f32]> {
        (**self).embedding()
    }

    fn created_at(&self) -> DateTime<Utc> {
        (**self).created_at()
    }

    fn retrieval_id(&self) -> &str {
        (**self).retrieval_id()
    }
}

/// Rank `candidates` by cosine similarity to `query` and keep the top `k`.
///
/// Candidates younger than `min_age_days` (whole days before `now`), without
/// an embedding, or with an embedding of another dimensionality are left out.
pub fn find_similar<T, I>(
    query: &[f32],
    candidates: I,
    k: usize,
    min_age_days: i64,
    now: DateTime<Utc>,
) -> Vec<Scored<T>>
where
    T: Retrievable,
    I: IntoIterator<Item = T>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Scored<T>> = candidates
        .into_iter()
        .filter(|c| age_in_days(c.created_at(), now) >= min_age_days)
        .filter_map(|candidate| {
            let embedding = candidate.embedding()?;
            match try_cosine_similarity(query, embedding) {
                Ok(score) => Some(Scored {
                    item: candidate,
                    score,
                }),
                Err(e) => {
                    warn!(id = candidate.retrieval_id(), error = %e, "skipping retrieval candidate");
                    None
                }
            }
        })
        .collect();

    // Stable sort: ties stay in candidate order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}

/// Rank the chunks of one document (or of all documents with `None`).
pub fn find_similar_chunks<'a>(
    query: &[f32],
    chunks: &'a [DocumentChunk],
    document_id: Option<&str>,
    k: usize,
    now: DateTime<Utc>,
) -> Vec<Scored<&'a DocumentChunk>> {
    let candidates = chunks
        .iter()
        .filter(|chunk| document_id.is_none_or(|doc| chunk.document_id == doc));
    find_similar(query, candidates, k, 0, now)
}

/// Restricts which memories a retrieval may return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalScope {
    pub persona_id: Option<String>,
    pub conversation_id: Option<String>,
    /// A memory never returned, e.g. the one used as the query.
    pub exclude_id: Option<String>,
}

impl RetrievalScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    pub fn conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    pub fn matches(&self, record: &MemoryRecord) -> bool {
        fn tag_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
            wanted.as_ref().is_none_or(|w| actual.as_ref() == Some(w))
        }
        tag_matches(&self.persona_id, &record.persona_id)
            && tag_matches(&self.conversation_id, &record.conversation_id)
            && self.exclude_id.as_deref() != Some(record.id.as_str())
    }
}

/// Embeds text queries and ranks a snapshot of the memory corpus.
pub struct SemanticRetriever {
    corpus: Arc<dyn MemoryCorpus>,
    embedder: Arc<dyn EmbeddingAdapter>,
    clock: Arc<dyn Clock>,
    config: RetrievalConfig,
}

impl SemanticRetriever {
    pub fn new(
        corpus: Arc<dyn MemoryCorpus>,
        embedder: Arc<dyn EmbeddingAdapter>,
        clock: Arc<dyn Clock>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            corpus,
            embedder,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top memories for a text query. Provider or storage failure yields an
    /// empty list.
    pub async fn retrieve(&self, query: &str, scope: &RetrievalScope) -> Vec<ScoredMemory> {
        let query_embedding = match self.embedder.embed_one(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "query embedding failed, returning no memories");
                recording::record_retrieval_query();
                return Vec::new();
            }
        };
        self.retrieve_by_embedding(&query_embedding, scope).await
    }

    /// Top memories for an already embedded query.
    pub async fn retrieve_by_embedding(
        &self,
        query_embedding: &[f32],
        scope: &RetrievalScope,
    ) -> Vec<ScoredMemory> {
        recording::record_retrieval_query();

        let snapshot = match self.corpus.load_memories().await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "memory snapshot failed, returning no memories");
                return Vec::new();
            }
        };

        let mut candidates: Vec<MemoryRecord> =
            snapshot.into_iter().filter(|r| scope.matches(r)).collect();
        if self.config.embed_missing {
            self.embed_missing(&mut candidates).await;
        }

        let results = find_similar(
            query_embedding,
            candidates,
            self.config.top_k,
            self.config.min_age_days,
            self.clock.now(),
        );
        debug!(hits = results.len(), "retrieval complete");
        results
    }

    /// Attach on-demand embeddings to candidates lacking one. Not persisted.
    async fn embed_missing(&self, candidates: &mut [MemoryRecord]) {
        for record in candidates.iter_mut().filter(|r| r.embedding.is_none()) {
            match self.embedder.embed_one(&record.fact).await {
                Ok(embedding) => record.embedding = Some(embedding),
                Err(e) => warn!(memory_id = %record.id, error = %e, "on-demand embedding failed"),
            }
        }
    }
}
