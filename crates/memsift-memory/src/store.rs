// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store and the corpus abstraction over it.
//!
//! Embeddings are kept in their comma-separated text form. A value that no
//! longer parses is logged and surfaces as a record without embedding; the
//! record itself is never dropped from a load.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::Connection;
use tracing::{debug, warn};

use memsift_config::model::StorageConfig;
use memsift_core::{AdapterType, HealthStatus, MemsiftError, PluginAdapter};

use crate::migrations::run_migrations;
use crate::recording;
use crate::types::MemoryRecord;
use crate::vector::{parse_embedding, serialize_embedding};

/// Read access to the memory corpus, plus embedding write-back for backfill.
#[async_trait]
pub trait MemoryCorpus: Send + Sync {
    /// Point-in-time snapshot of every memory, in insertion order.
    async fn load_memories(&self) -> Result<Vec<MemoryRecord>, MemsiftError>;

    /// Attach an embedding to a memory. Returns `false` if the id is unknown.
    async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool, MemsiftError>;
}

fn map_tr_err<E>(e: tokio_rusqlite::Error<E>) -> MemsiftError
where
    E: std::error::Error + Send + Sync + 'static,
{
    MemsiftError::Storage {
        source: Box::new(e),
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, fact, embedding, created_at, persona_id, conversation_id FROM memories";

/// A row as stored, before the embedding and timestamp are decoded.
struct StoredRow {
    id: String,
    fact: String,
    embedding: Option<String>,
    created_at: String,
    persona_id: Option<String>,
    conversation_id: Option<String>,
}

fn read_row(row: &rusqlite::Row<'_>) -> Result<StoredRow, rusqlite::Error> {
    Ok(StoredRow {
        id: row.get(0)?,
        fact: row.get(1)?,
        embedding: row.get(2)?,
        created_at: row.get(3)?,
        persona_id: row.get(4)?,
        conversation_id: row.get(5)?,
    })
}

fn decode_row(row: StoredRow) -> Result<MemoryRecord, MemsiftError> {
    let created_at = DateTime::parse_from_rfc3339(&row.created_at)
        .map_err(|e| MemsiftError::Storage {
            source: format!("memory {} has invalid created_at `{}`: {e}", row.id, row.created_at)
                .into(),
        })?
        .with_timezone(&Utc);

    let embedding = match row.embedding.as_deref() {
        None => None,
        Some(raw) => match parse_embedding(raw) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(memory_id = %row.id, error = %e, "ignoring unreadable embedding");
                recording::record_embedding_parse_failure();
                None
            }
        },
    };

    Ok(MemoryRecord {
        id: row.id,
        fact: row.fact,
        embedding,
        created_at,
        persona_id: row.persona_id,
        conversation_id: row.conversation_id,
    })
}

fn decode_rows(rows: Vec<StoredRow>) -> Result<Vec<MemoryRecord>, MemsiftError> {
    rows.into_iter().map(decode_row).collect()
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Persistent store for memory facts in SQLite.
///
/// All statements run on tokio-rusqlite's single background thread.
pub struct MemoryStore {
    conn: Connection,
}

impl MemoryStore {
    /// Open (or create) the database at `path` and apply migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, MemsiftError> {
        let conn = Connection::open(path).await.map_err(|e| MemsiftError::Storage {
            source: Box::new(e),
        })?;
        let store = Self::initialize(conn, wal_mode).await?;
        debug!(path, wal_mode, "memory store opened");
        Ok(store)
    }

    /// Open the store described by the storage config, creating parent dirs.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, MemsiftError> {
        if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MemsiftError::Storage {
                    source: Box::new(e),
                })?;
            }
        }
        Self::open(&config.database_path, config.wal_mode).await
    }

    /// A private, empty in-memory database.
    pub async fn open_in_memory() -> Result<Self, MemsiftError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| MemsiftError::Storage {
                source: Box::new(e),
            })?;
        Self::initialize(conn, false).await
    }

    async fn initialize(conn: Connection, wal_mode: bool) -> Result<Self, MemsiftError> {
        if wal_mode {
            conn.call(|conn| -> Result<(), rusqlite::Error> {
                let _mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        }

        conn.call(|conn| -> Result<(), refinery::Error> { run_migrations(conn) })
            .await
            .map_err(map_tr_err)?;

        Ok(Self { conn })
    }

    /// Insert a memory, or replace the stored fields of an existing id.
    ///
    /// Replacing keeps the original insertion position.
    pub async fn save(&self, record: &MemoryRecord) -> Result<(), MemsiftError> {
        let id = record.id.clone();
        let fact = record.fact.clone();
        let embedding = record.embedding.as_deref().map(serialize_embedding);
        let created_at = format_timestamp(&record.created_at);
        let persona_id = record.persona_id.clone();
        let conversation_id = record.conversation_id.clone();

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO memories (id, fact, embedding, created_at, persona_id, conversation_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                     ON CONFLICT(id) DO UPDATE SET fact = excluded.fact, embedding = excluded.embedding, \
                     created_at = excluded.created_at, persona_id = excluded.persona_id, \
                     conversation_id = excluded.conversation_id",
                    rusqlite::params![id, fact, embedding, created_at, persona_id, conversation_id],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Get a memory by id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<MemoryRecord>, MemsiftError> {
        let id = id.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<StoredRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
                let mut rows = stmt.query_map(rusqlite::params![id], read_row)?;
                rows.next().transpose()
            })
            .await
            .map_err(map_tr_err)?;
        row.map(decode_row).transpose()
    }

    /// Every memory in insertion order.
    pub async fn list_all(&self) -> Result<Vec<MemoryRecord>, MemsiftError> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<StoredRow>, rusqlite::Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid"))?;
                let rows = stmt
                    .query_map([], read_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;
        decode_rows(rows)
    }

    /// Memories tagged with `persona_id`, in insertion order.
    pub async fn list_by_persona(&self, persona_id: &str) -> Result<Vec<MemoryRecord>, MemsiftError> {
        let persona_id = persona_id.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<StoredRow>, rusqlite::Error> {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_COLUMNS} WHERE persona_id = ?1 ORDER BY rowid"))?;
                let rows = stmt
                    .query_map(rusqlite::params![persona_id], read_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;
        decode_rows(rows)
    }

    /// Store an embedding for an existing memory. Returns `false` if the id is unknown.
    pub async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool, MemsiftError> {
        let id = id.to_string();
        let serialized = serialize_embedding(embedding);
        let updated = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE memories SET embedding = ?1 WHERE id = ?2",
                    rusqlite::params![serialized, id],
                )
            })
            .await
            .map_err(map_tr_err)?;
        Ok(updated > 0)
    }

    /// Delete a memory. Returns `false` if the id is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool, MemsiftError> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute("DELETE FROM memories WHERE id = ?1", rusqlite::params![id])
            })
            .await
            .map_err(map_tr_err)?;
        Ok(deleted > 0)
    }

    /// Number of stored memories.
    pub async fn count(&self) -> Result<usize, MemsiftError> {
        let count = self
            .conn
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(count.max(0) as usize)
    }

    #[cfg(test)]
    async fn write_raw_embedding(&self, id: &str, raw: &str) {
        let id = id.to_string();
        let raw = raw.to_string();
        self.conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE memories SET embedding = ?1 WHERE id = ?2",
                    rusqlite::params![raw, id],
                )
            })
            .await
            .unwrap();
    }
}

#[async_trait]
impl MemoryCorpus for MemoryStore {
    async fn load_memories(&self) -> Result<Vec<MemoryRecord>, MemsiftError> {
        self.list_all().await
    }

    async fn set_embedding(&self, id: &str, embedding: &[f32]) -> Result<bool, MemsiftError> {
        MemoryStore::set_embedding(self, id, embedding).await
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "sqlite-memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, MemsiftError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 8, 30, 0).unwrap()
    }

    fn record(id: &str, fact: &str) -> MemoryRecord {
        MemoryRecord::new(id, fact, ts(1)).with_embedding(vec![0.25, -0.5, 1.0])
    }

    #[tokio::test]
    async fn save_and_get_by_id() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        let original = record("mem-1", "User's dog is named Max")
            .with_persona("assistant")
            .with_conversation("conv-7");
        store.save(&original).await.unwrap();

        let loaded = store.get_by_id("mem-1").await.unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn get_by_id_nonexistent() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        assert!(store.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn record_without_embedding_round_trips() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        let bare = MemoryRecord::new("mem-1", "Prefers green tea", ts(2));
        store.save(&bare).await.unwrap();
        let loaded = store.get_by_id("mem-1").await.unwrap().unwrap();
        assert!(loaded.embedding.is_none());
        assert_eq!(loaded.created_at, ts(2));
    }

    #[tokio::test]
    async fn list_all_keeps_insertion_order_across_updates() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        for id in ["c", "a", "b"] {
            store.save(&record(id, "fact")).await.unwrap();
        }
        // Updating an existing id must not move it to the end.
        store.save(&record("c", "changed fact")).await.unwrap();

        let ids: Vec<String> = store.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(store.get_by_id("c").await.unwrap().unwrap().fact, "changed fact");
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn list_by_persona_filters() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        store.save(&record("a", "one").with_persona("p1")).await.unwrap();
        store.save(&record("b", "two").with_persona("p2")).await.unwrap();
        store.save(&record("c", "three").with_persona("p1")).await.unwrap();

        let ids: Vec<String> = store
            .list_by_persona("p1")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn set_embedding_and_delete() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        store
            .save(&MemoryRecord::new("a", "Owns a bicycle", ts(1)))
            .await
            .unwrap();

        assert!(store.set_embedding("a", &[0.5, 0.5]).await.unwrap());
        assert!(!store.set_embedding("zzz", &[0.5, 0.5]).await.unwrap());
        assert_eq!(
            store.get_by_id("a").await.unwrap().unwrap().embedding,
            Some(vec![0.5, 0.5])
        );

        assert!(store.delete("a").await.unwrap());
        assert!(!store.delete("a").await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreadable_embedding_loads_as_missing() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        store.save(&record("good", "Reads sci-fi")).await.unwrap();
        store.save(&record("bad", "Plays chess")).await.unwrap();
        store.write_raw_embedding("bad", "0.1,oops,0.3").await;

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].embedding.is_some());
        assert!(all[1].embedding.is_none());
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memsift.db");
        let path = path.to_str().unwrap();
        {
            let store = MemoryStore::open(path, true).await.unwrap();
            store.save(&record("a", "Lives in Lisbon")).await.unwrap();
        }
        let reopened = MemoryStore::open(path, true).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn from_config_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            database_path: dir.path().join("nested/deeper/memsift.db").display().to_string(),
            wal_mode: false,
        };
        let store = MemoryStore::from_config(&config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn corpus_trait_delegates_to_store() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        store.save(&record("a", "fact")).await.unwrap();
        let corpus: &dyn MemoryCorpus = &store;
        assert_eq!(corpus.load_memories().await.unwrap().len(), 1);
        assert!(corpus.set_embedding("a", &[1.0]).await.unwrap());
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let store = MemoryStore::open_in_memory().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }
}
