// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory corpus for tests that do not need SQLite.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use memsift_core::MemsiftError;
use memsift_memory::{MemoryCorpus, MemoryRecord};

/// A corpus held in a vector, with switchable load failures.
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    records: RwLock<Vec<MemoryRecord>>,
    fail_loads: AtomicBool,
}

impl InMemoryCorpus {
    pub fn new(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            fail_loads: AtomicBool::new(false),
        }
    }

    /// A corpus whose loads fail with a storage error.
    pub fn failing() -> Self {
        let corpus = Self::default();
        corpus.set_failing(true);
        corpus
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_loads.store(failing, Ordering::SeqCst);
    }

    pub async fn push(&self, record: MemoryRecord) {
        self.records.write().await.push(record);
    }

    pub async fn records(&self) -> Vec<MemoryRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl MemoryCorpus for InMemoryCorpus {
    async fn load_memories(&self) -> Result<Vec<MemoryRecord>, MemsiftError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(MemsiftError::Storage {
                source: "in-memory corpus set to fail".into(),
            });
        }
        Ok(self.records.read().await.clone())
    }

    async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool, MemsiftError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.embedding = Some(embedding.to_vec());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
