// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thematic clustering and semantic retrieval over memory facts.
//!
//! ## Architecture
//!
//! - **vector**: cosine similarity, centroids, at-rest embedding format
//! - **tokenizer**: stop-word filtered keyword sets and Jaccard overlap
//! - **similarity**: hybrid embedding + keyword score against a group
//! - **clusterer**: order-dependent greedy coarse clustering
//! - **refiner**: size-range enforcement and the outliers bucket
//! - **cluster_metrics**: density, diversity, age and review priority
//! - **pipeline** / **status**: the staged clustering job and its observable status
//! - **retriever** / **provider**: top-K retrieval and context injection
//! - **store** / **backfill**: SQLite persistence and lazy embedding backfill
//! - **embedder**: local feature-hashing embedding adapter

pub mod backfill;
pub mod cluster_metrics;
pub mod clusterer;
pub mod embedder;
pub mod migrations;
pub mod pipeline;
pub mod provider;
pub mod recording;
pub mod refiner;
pub mod retriever;
pub mod similarity;
pub mod status;
pub mod store;
pub mod tokenizer;
pub mod types;
pub mod vector;

pub use backfill::{backfill_embeddings, BackfillReport};
pub use clusterer::{coarse_cluster, CoarseLabels, DEFAULT_SIMILARITY_THRESHOLD};
pub use embedder::{HashingEmbedder, HASHING_DIM};
pub use pipeline::{cluster_memories, ClusteringOptions, ClusteringPipeline};
pub use provider::MemoryContextProvider;
pub use refiner::{refine, RefinedGroups, SizeRange};
pub use retriever::{find_similar, find_similar_chunks, Retrievable, RetrievalScope, SemanticRetriever};
pub use similarity::{HybridScorer, ScoringInput};
pub use status::{ClusteringStatus, StatusHandle};
pub use store::{MemoryCorpus, MemoryStore};
pub use tokenizer::Tokenizer;
pub use types::*;
pub use vector::{centroid, cosine_similarity, parse_embedding, serialize_embedding};
