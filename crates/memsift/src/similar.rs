// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memsift similar` command implementation.

use std::sync::Arc;

use serde::Serialize;

use memsift_config::model::MemsiftConfig;
use memsift_core::{Clock, EmbeddingAdapter, MemsiftError, SystemClock};
use memsift_memory::{
    parse_embedding, HashingEmbedder, MemoryStore, RetrievalScope, ScoredMemory,
    SemanticRetriever, Tokenizer, HASHING_DIM,
};

/// Where the query embedding comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// The stored embedding of another memory, which is left out of the results.
    Like(String),
    /// A comma-separated vector.
    Embedding(String),
}

impl Query {
    pub fn from_args(like: Option<String>, embedding: Option<String>) -> Option<Self> {
        match (like, embedding) {
            (Some(id), _) => Some(Self::Like(id)),
            (None, Some(csv)) => Some(Self::Embedding(csv)),
            (None, None) => None,
        }
    }
}

/// One ranked hit in `--json` output.
#[derive(Debug, Serialize)]
pub struct SimilarHit {
    pub id: String,
    pub fact: String,
    pub score: f64,
}

impl From<ScoredMemory> for SimilarHit {
    fn from(hit: ScoredMemory) -> Self {
        Self {
            id: hit.item.id,
            fact: hit.item.fact,
            score: hit.score,
        }
    }
}

/// Run the `memsift similar` command.
pub async fn run_similar(
    config: &MemsiftConfig,
    query: Query,
    persona: Option<String>,
    json: bool,
) -> Result<(), MemsiftError> {
    let hits = find_hits(config, query, persona).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&hits)
            .map_err(|e| MemsiftError::Internal(format!("failed to serialize results: {e}")))?;
        println!("{rendered}");
    } else if hits.is_empty() {
        println!("no similar memories");
    } else {
        for hit in &hits {
            println!("{:.4}  [{}] {}", hit.score, hit.id, hit.fact);
        }
    }
    Ok(())
}

/// Resolve the query and rank the stored memories against it.
pub async fn find_hits(
    config: &MemsiftConfig,
    query: Query,
    persona: Option<String>,
) -> Result<Vec<SimilarHit>, MemsiftError> {
    let store = Arc::new(MemoryStore::from_config(&config.storage).await?);

    let mut scope = RetrievalScope::all();
    if let Some(persona) = persona {
        scope = scope.persona(persona);
    }

    let query_embedding = match query {
        Query::Embedding(csv) => parse_embedding(&csv)?,
        Query::Like(id) => {
            let record = store
                .get_by_id(&id)
                .await?
                .ok_or_else(|| MemsiftError::Internal(format!("memory `{id}` not found")))?;
            scope = scope.excluding(id);
            record
                .embedding
                .ok_or(MemsiftError::MissingEmbeddings { count: 1 })?
        }
    };

    let tokenizer = Arc::new(Tokenizer::from_config(&config.clustering)?);
    let embedder = HashingEmbedder::new(tokenizer, HASHING_DIM)?;
    let retriever = SemanticRetriever::new(
        store,
        Arc::new(embedder) as Arc<dyn EmbeddingAdapter>,
        Arc::new(SystemClock) as Arc<dyn Clock>,
        config.retrieval.clone(),
    );

    let hits = retriever.retrieve_by_embedding(&query_embedding, &scope).await;
    Ok(hits.into_iter().map(SimilarHit::from).collect())
}
