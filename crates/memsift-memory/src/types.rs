// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for clustering and retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use memsift_core::MemsiftError;

/// Reserved cluster id for the outliers bucket.
pub const OUTLIER_CLUSTER_ID: i64 = -1;

/// A single memory fact as persisted by the memory store.
///
/// Clustering and retrieval treat records as read-only inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable identifier.
    pub id: String,
    /// The factual statement.
    pub fact: String,
    /// Embedding vector, absent until attached at save time or backfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Creation timestamp, the basis for age computation.
    pub created_at: DateTime<Utc>,
    /// Persona tag, used only as a retrieval scope filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    /// Conversation tag, used only as a retrieval scope filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl MemoryRecord {
    /// Creates a record without embedding or scope tags.
    pub fn new(id: impl Into<String>, fact: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            fact: fact.into(),
            embedding: None,
            created_at,
            persona_id: None,
            conversation_id: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// Whole days elapsed between `created_at` and `now`, floored, never negative.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days().max(0)
}

/// Per-run view of a memory with its age and (guaranteed) embedding.
///
/// Built once per clustering run and owned by that run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryWithAge {
    /// The underlying record. Its embedding has moved into [`Self::embedding`].
    pub memory: MemoryRecord,
    /// Whole days since creation.
    pub age_days: i64,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl MemoryWithAge {
    /// Builds the view, taking the embedding out of the record.
    ///
    /// Fails with [`MemsiftError::MissingEmbeddings`] when the record has none.
    pub fn from_record(mut memory: MemoryRecord, now: DateTime<Utc>) -> Result<Self, MemsiftError> {
        let embedding = memory
            .embedding
            .take()
            .ok_or(MemsiftError::MissingEmbeddings { count: 1 })?;
        let age_days = age_in_days(memory.created_at, now);
        Ok(Self {
            memory,
            age_days,
            embedding,
        })
    }

    pub fn id(&self) -> &str {
        &self.memory.id
    }

    pub fn fact(&self) -> &str {
        &self.memory.fact
    }
}

/// A group of memories with cohesion and review statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Non-negative for thematic clusters, [`OUTLIER_CLUSTER_ID`] for outliers.
    pub id: i64,
    /// Members in corpus order. Never empty.
    pub members: Vec<MemoryWithAge>,
    /// Mean cosine of members to their centroid.
    pub density: f64,
    /// Rounded mean member age in days.
    pub avg_age_days: i64,
    /// One minus the mean pairwise cosine, zero for single-member clusters.
    pub diversity: f64,
    /// Review ranking score in `[0, 1]`.
    pub priority_score: f64,
}

impl Cluster {
    pub fn is_outliers(&self) -> bool {
        self.id == OUTLIER_CLUSTER_ID
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(MemoryWithAge::id)
    }
}

/// Outcome of a clustering run.
///
/// Every input memory appears exactly once across `clusters` and `outliers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringResult {
    pub clusters: Vec<Cluster>,
    /// Absent when no memory ended up as an outlier.
    pub outliers: Option<Cluster>,
    pub total_memories: usize,
}

impl ClusteringResult {
    /// Clusters ranked for review: priority descending, ties by id.
    pub fn by_priority(&self) -> Vec<&Cluster> {
        let mut ranked: Vec<&Cluster> = self.clusters.iter().collect();
        ranked.sort_by(|a, b| {
            b.priority_score
                .total_cmp(&a.priority_score)
                .then(a.id.cmp(&b.id))
        });
        ranked
    }

    /// Number of memories placed in clusters and outliers together.
    pub fn member_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum::<usize>()
            + self.outliers.as_ref().map_or(0, Cluster::len)
    }
}

/// A retrieval hit with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scored<T> {
    pub item: T,
    pub score: f64,
}

/// A memory ranked against a query.
pub type ScoredMemory = Scored<MemoryRecord>;

/// A chunk of an ingested document, retrievable alongside memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    /// Owning document; chunk retrieval is usually scoped to one document.
    pub document_id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}
