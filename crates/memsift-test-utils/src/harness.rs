// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a file-backed memory store in a temp directory,
//! a mock embedder, a fixed clock, the clustering pipeline and the semantic
//! retriever, all sharing one corpus.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use memsift_config::model::{MemsiftConfig, RetrievalConfig, StorageConfig};
use memsift_core::{Clock, EmbeddingAdapter, MemsiftError};
use memsift_memory::{
    ClusteringPipeline, MemoryContextProvider, MemoryCorpus, MemoryRecord, MemoryStore,
    SemanticRetriever, Tokenizer,
};

use crate::clock::FixedClock;
use crate::mock_embedder::MockEmbedder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    records: Vec<MemoryRecord>,
    now: Option<DateTime<Utc>>,
    embedder: MockEmbedder,
    retrieval: RetrievalConfig,
    auto_reset: Option<Duration>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            records: Vec::new(),
            now: None,
            embedder: MockEmbedder::new(),
            retrieval: RetrievalConfig::default(),
            auto_reset: None,
        }
    }

    /// Seed the store with these records, saved in order.
    pub fn with_memories(mut self, records: Vec<MemoryRecord>) -> Self {
        self.records = records;
        self
    }

    /// Pin the clock. Defaults to the current time at build.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_auto_reset(mut self, delay: Duration) -> Self {
        self.auto_reset = Some(delay);
        self
    }

    /// Build the harness, creating the temp database and all subsystems.
    pub async fn build(self) -> Result<TestHarness, MemsiftError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MemsiftError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");
        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };

        let store = Arc::new(MemoryStore::from_config(&storage).await?);
        for record in &self.records {
            store.save(record).await?;
        }

        let clock = Arc::new(FixedClock::new(self.now.unwrap_or_else(Utc::now)));
        let embedder = Arc::new(self.embedder);
        let corpus: Arc<dyn MemoryCorpus> = store.clone();

        let mut pipeline = ClusteringPipeline::new(
            Arc::clone(&corpus),
            clock.clone() as Arc<dyn Clock>,
            Arc::new(Tokenizer::default()),
        );
        if let Some(delay) = self.auto_reset {
            pipeline = pipeline.with_auto_reset(delay);
        }

        let retriever = Arc::new(SemanticRetriever::new(
            corpus,
            embedder.clone() as Arc<dyn EmbeddingAdapter>,
            clock.clone() as Arc<dyn Clock>,
            self.retrieval.clone(),
        ));

        let config = MemsiftConfig {
            storage,
            retrieval: self.retrieval,
            ..MemsiftConfig::default()
        };

        Ok(TestHarness {
            store,
            embedder,
            clock,
            pipeline,
            retriever,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over a temp SQLite store.
pub struct TestHarness {
    /// The memory store (temp DB, cleaned up on drop).
    pub store: Arc<MemoryStore>,
    pub embedder: Arc<MockEmbedder>,
    pub clock: Arc<FixedClock>,
    pub pipeline: ClusteringPipeline,
    pub retriever: Arc<SemanticRetriever>,
    /// Configuration matching the assembled subsystems.
    pub config: MemsiftConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A context provider over this harness's retriever.
    pub fn context_provider(&self) -> MemoryContextProvider {
        MemoryContextProvider::new(Arc::clone(&self.retriever))
    }
}
