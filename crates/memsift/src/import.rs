// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memsift import` command implementation.
//!
//! Reads JSON Lines, one memory per line:
//!
//! ```text
//! {"id": "m1", "fact": "User has a dog named Max", "embedding": [0.1, 0.2],
//!  "created_at": "2026-01-05T10:00:00Z", "persona_id": "p1", "conversation_id": "c9"}
//! ```
//!
//! Only `id` and `fact` are required; `created_at` defaults to the import time.
//! Re-importing an id replaces the stored memory.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use memsift_config::model::MemsiftConfig;
use memsift_core::MemsiftError;
use memsift_memory::{MemoryRecord, MemoryStore};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportLine {
    id: String,
    fact: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    persona_id: Option<String>,
    #[serde(default)]
    conversation_id: Option<String>,
}

impl ImportLine {
    fn into_record(self, imported_at: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord {
            id: self.id,
            fact: self.fact,
            embedding: self.embedding,
            created_at: self.created_at.unwrap_or(imported_at),
            persona_id: self.persona_id,
            conversation_id: self.conversation_id,
        }
    }
}

/// Counts from one import.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Imported memories that came without an embedding.
    pub without_embedding: usize,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!(
            "imported {} memories ({} without embedding)",
            self.imported, self.without_embedding
        )
    }
}

/// Parse every non-blank line, failing on the first bad one with its line number.
fn parse_lines(content: &str, imported_at: DateTime<Utc>) -> Result<Vec<MemoryRecord>, MemsiftError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let line_no = index + 1;
            let parsed: ImportLine = serde_json::from_str(line).map_err(|e| {
                MemsiftError::Internal(format!("line {line_no}: invalid memory record: {e}"))
            })?;
            if parsed.id.trim().is_empty() {
                return Err(MemsiftError::Internal(format!("line {line_no}: empty id")));
            }
            if let Some(embedding) = &parsed.embedding
                && (embedding.is_empty() || embedding.iter().any(|v| !v.is_finite()))
            {
                return Err(MemsiftError::EmbeddingParse {
                    reason: format!("line {line_no}: embedding must be non-empty and finite"),
                });
            }
            Ok(parsed.into_record(imported_at))
        })
        .collect()
}

/// Run the `memsift import` command. Nothing is written if any line is invalid.
pub async fn run_import(config: &MemsiftConfig, path: &Path) -> Result<ImportReport, MemsiftError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MemsiftError::Internal(format!("failed to read {}: {e}", path.display())))?;
    let records = parse_lines(&content, Utc::now())?;

    let store = MemoryStore::from_config(&config.storage).await?;
    let mut report = ImportReport::default();
    for record in &records {
        store.save(record).await?;
        report.imported += 1;
        if record.embedding.is_none() {
            report.without_embedding += 1;
        }
    }

    info!(
        imported = report.imported,
        without_embedding = report.without_embedding,
        path = %path.display(),
        "memories imported"
    );
    Ok(report)
}
