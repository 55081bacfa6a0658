// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory context injection for conversations.
//!
//! The host records each conversation's latest user message with
//! `set_current_query`; `provide_context` then retrieves matching memories
//! and renders them as a markdown block.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::retriever::{RetrievalScope, SemanticRetriever};
use crate::types::ScoredMemory;

/// Header of the injected memory block.
pub const MEMORY_BLOCK_HEADER: &str = "## Relevant Memories";

/// Render retrieved memories as a bullet list under [`MEMORY_BLOCK_HEADER`].
pub fn format_memories(memories: &[ScoredMemory]) -> String {
    let mut text = format!("{MEMORY_BLOCK_HEADER}\n");
    for scored in memories {
        text.push_str(&format!("- {}\n", scored.item.fact));
    }
    text
}

/// Supplies relevant long-term memories as conversation context.
pub struct MemoryContextProvider {
    retriever: Arc<SemanticRetriever>,
    scope: RetrievalScope,
    /// Per-conversation current query.
    current_queries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryContextProvider {
    pub fn new(retriever: Arc<SemanticRetriever>) -> Self {
        Self::with_scope(retriever, RetrievalScope::all())
    }

    /// Provider that only ever injects memories inside `scope`.
    pub fn with_scope(retriever: Arc<SemanticRetriever>, scope: RetrievalScope) -> Self {
        Self {
            retriever,
            scope,
            current_queries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record the latest user message of a conversation.
    pub async fn set_current_query(&self, conversation_id: &str, query: &str) {
        self.current_queries
            .write()
            .await
            .insert(conversation_id.to_string(), query.to_string());
    }

    /// Forget the query once context assembly is done.
    pub async fn clear_current_query(&self, conversation_id: &str) {
        self.current_queries.write().await.remove(conversation_id);
    }

    async fn current_query(&self, conversation_id: &str) -> String {
        self.current_queries
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The memory block for a conversation, or `None` when there is no
    /// query or nothing relevant was found.
    pub async fn provide_context(&self, conversation_id: &str) -> Option<String> {
        let query = self.current_query(conversation_id).await;
        if query.trim().is_empty() {
            return None;
        }

        let memories = self.retriever.retrieve(&query, &self.scope).await;
        if memories.is_empty() {
            return None;
        }
        Some(format_memories(&memories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryRecord, Scored};
    use chrono::Utc;

    fn scored(fact: &str, score: f64) -> ScoredMemory {
        Scored {
            item: MemoryRecord::new("id", fact, Utc::now()),
            score,
        }
    }

    #[test]
    fn format_memories_header_and_bullets() {
        let memories = vec![
            scored("User has a dog named Max", 0.8),
            scored("User prefers dark mode", 0.7),
        ];
        assert_eq!(
            format_memories(&memories),
            "## Relevant Memories\n- User has a dog named Max\n- User prefers dark mode\n"
        );
    }

    #[test]
    fn format_memories_empty() {
        assert_eq!(format_memories(&[]), "## Relevant Memories\n");
    }
}
