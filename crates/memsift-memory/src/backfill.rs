// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lazy embedding backfill for memories saved without a vector.

use serde::Serialize;
use tracing::{info, warn};

use memsift_core::{EmbeddingAdapter, MemsiftError};

use crate::store::MemoryCorpus;

/// Outcome counts of a backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Memories that received a new embedding.
    pub embedded: usize,
    /// Memories the provider could not embed; a later pass retries them.
    pub failed: usize,
    /// Memories that already had an embedding.
    pub skipped: usize,
}

/// Embed every memory lacking an embedding and write it back to the corpus.
///
/// Provider failures are counted and skipped. Storage failures abort the pass.
pub async fn backfill_embeddings(
    corpus: &dyn MemoryCorpus,
    embedder: &dyn EmbeddingAdapter,
) -> Result<BackfillReport, MemsiftError> {
    let mut report = BackfillReport::default();

    for record in corpus.load_memories().await? {
        if record.embedding.is_some() {
            report.skipped += 1;
            continue;
        }
        match embedder.embed_one(&record.fact).await {
            Ok(embedding) => {
                corpus.set_embedding(&record.id, &embedding).await?;
                report.embedded += 1;
            }
            Err(e) => {
                warn!(memory_id = %record.id, error = %e, "embedding backfill failed");
                report.failed += 1;
            }
        }
    }

    info!(
        embedded = report.embedded,
        failed = report.failed,
        skipped = report.skipped,
        "embedding backfill finished"
    );
    Ok(report)
}
