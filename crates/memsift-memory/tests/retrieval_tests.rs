// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic retrieval over a SQLite-backed store, including degraded modes.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use memsift_config::model::RetrievalConfig;
use memsift_core::{Clock, EmbeddingAdapter};
use memsift_memory::provider::MEMORY_BLOCK_HEADER;
use memsift_memory::{
    backfill_embeddings, BackfillReport, MemoryRecord, RetrievalScope, SemanticRetriever,
};
use memsift_test_utils::{memory_aged, FixedClock, InMemoryCorpus, MockEmbedder, TestHarness};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
}

/// Ten memories at increasing angles from the x axis, saved out of order.
fn fan() -> Vec<MemoryRecord> {
    [7, 2, 9, 0, 5, 3, 8, 1, 6, 4]
        .into_iter()
        .map(|i| {
            let angle = i as f32 * 0.15;
            memory_aged(
                &format!("m{i}"),
                &format!("fact {i}"),
                vec![angle.cos(), angle.sin()],
                now(),
                i64::from(i) * 3,
            )
        })
        .collect()
}

fn retrieval(top_k: usize, min_age_days: i64) -> RetrievalConfig {
    RetrievalConfig {
        top_k,
        min_age_days,
        ..RetrievalConfig::default()
    }
}

fn ids(hits: &[memsift_memory::ScoredMemory]) -> Vec<&str> {
    hits.iter().map(|h| h.item.id.as_str()).collect()
}

#[tokio::test]
async fn top_three_of_ten_by_similarity() {
    let harness = TestHarness::builder()
        .with_memories(fan())
        .at(now())
        .with_retrieval(retrieval(3, 0))
        .build()
        .await
        .unwrap();

    let hits = harness
        .retriever
        .retrieve_by_embedding(&[1.0, 0.0], &RetrievalScope::all())
        .await;

    assert_eq!(ids(&hits), vec!["m0", "m1", "m2"]);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
    assert!(hits.windows(2).all(|w| w[0].score > w[1].score));
}

#[tokio::test]
async fn min_age_skips_recent_memories() {
    // Ages are 3 * i days; a 12 day minimum drops m0..m3.
    let harness = TestHarness::builder()
        .with_memories(fan())
        .at(now())
        .with_retrieval(retrieval(3, 12))
        .build()
        .await
        .unwrap();

    let hits = harness
        .retriever
        .retrieve_by_embedding(&[1.0, 0.0], &RetrievalScope::all())
        .await;
    assert_eq!(ids(&hits), vec!["m4", "m5", "m6"]);
}

#[tokio::test]
async fn text_query_goes_through_the_embedder() {
    let embedder = MockEmbedder::new().with_vector("where do I hike", vec![0.0, 1.0]);
    let harness = TestHarness::builder()
        .with_memories(fan())
        .at(now())
        .with_embedder(embedder)
        .with_retrieval(retrieval(2, 0))
        .build()
        .await
        .unwrap();

    let hits = harness.retriever.retrieve("where do I hike", &RetrievalScope::all()).await;
    assert_eq!(ids(&hits), vec!["m9", "m8"]);
    assert_eq!(harness.embedder.calls(), 1);
}

#[tokio::test]
async fn unavailable_provider_yields_no_memories() {
    let harness = TestHarness::builder()
        .with_memories(fan())
        .with_embedder(MockEmbedder::unavailable())
        .build()
        .await
        .unwrap();

    assert!(harness.retriever.retrieve("anything", &RetrievalScope::all()).await.is_empty());
}

#[tokio::test]
async fn storage_failure_yields_no_memories() {
    let retriever = SemanticRetriever::new(
        Arc::new(InMemoryCorpus::failing()),
        Arc::new(MockEmbedder::new()) as Arc<dyn EmbeddingAdapter>,
        Arc::new(FixedClock::new(now())) as Arc<dyn Clock>,
        RetrievalConfig::default(),
    );

    assert!(retriever.retrieve("anything", &RetrievalScope::all()).await.is_empty());
}

#[tokio::test]
async fn scope_limits_candidates() {
    let records = vec![
        memory_aged("p1-a", "likes tea", vec![1.0, 0.0], now(), 1).with_persona("p1"),
        memory_aged("p2-a", "likes coffee", vec![1.0, 0.0], now(), 1).with_persona("p2"),
        memory_aged("p1-b", "plays chess", vec![0.0, 1.0], now(), 1).with_persona("p1"),
    ];
    let harness = TestHarness::builder()
        .with_memories(records)
        .at(now())
        .build()
        .await
        .unwrap();

    let scope = RetrievalScope::all().persona("p1");
    let hits = harness.retriever.retrieve_by_embedding(&[1.0, 0.0], &scope).await;
    assert_eq!(ids(&hits), vec!["p1-a", "p1-b"]);

    let scope = RetrievalScope::all().excluding("p1-a");
    let hits = harness.retriever.retrieve_by_embedding(&[1.0, 0.0], &scope).await;
    assert_eq!(ids(&hits)[0], "p2-a");
}

#[tokio::test]
async fn unembedded_memories_are_skipped_unless_embedded_on_demand() {
    let records = vec![
        memory_aged("has-vector", "likes tea", vec![0.0, 1.0], now(), 1),
        MemoryRecord::new("no-vector", "likes hiking", now()),
    ];
    let embedder = || MockEmbedder::new().with_vector("likes hiking", vec![1.0, 0.0]);

    let plain = TestHarness::builder()
        .with_memories(records.clone())
        .with_embedder(embedder())
        .build()
        .await
        .unwrap();
    let hits = plain.retriever.retrieve_by_embedding(&[1.0, 0.0], &RetrievalScope::all()).await;
    assert_eq!(ids(&hits), vec!["has-vector"]);

    let on_demand = TestHarness::builder()
        .with_memories(records)
        .with_embedder(embedder())
        .with_retrieval(RetrievalConfig {
            embed_missing: true,
            ..RetrievalConfig::default()
        })
        .build()
        .await
        .unwrap();
    let hits = on_demand
        .retriever
        .retrieve_by_embedding(&[1.0, 0.0], &RetrievalScope::all())
        .await;
    assert_eq!(ids(&hits), vec!["no-vector", "has-vector"]);

    // On-demand vectors are not written back.
    let stored = on_demand.store.get_by_id("no-vector").await.unwrap().unwrap();
    assert!(stored.embedding.is_none());
}

#[tokio::test]
async fn context_provider_renders_relevant_memories() {
    let embedder = MockEmbedder::new().with_vector("weekend plans", vec![1.0, 0.0]);
    let harness = TestHarness::builder()
        .with_memories(fan())
        .at(now())
        .with_embedder(embedder)
        .with_retrieval(retrieval(2, 0))
        .build()
        .await
        .unwrap();
    let provider = harness.context_provider();

    assert!(provider.provide_context("conv-1").await.is_none());

    provider.set_current_query("conv-1", "weekend plans").await;
    let block = provider.provide_context("conv-1").await.unwrap();
    assert_eq!(block, format!("{MEMORY_BLOCK_HEADER}\n- fact 0\n- fact 1\n"));

    assert!(provider.provide_context("conv-2").await.is_none());
    provider.clear_current_query("conv-1").await;
    assert!(provider.provide_context("conv-1").await.is_none());
}

#[tokio::test]
async fn backfill_embeds_what_it_can() {
    let corpus = InMemoryCorpus::new(vec![
        memory_aged("done", "already embedded", vec![1.0, 0.0], now(), 1),
        MemoryRecord::new("todo", "likes tea", now()),
        MemoryRecord::new("broken", "provider chokes here", now()),
    ]);
    let embedder = MockEmbedder::new().failing_on("provider chokes here");

    let report = backfill_embeddings(&corpus, &embedder).await.unwrap();
    assert_eq!(
        report,
        BackfillReport {
            embedded: 1,
            failed: 1,
            skipped: 1,
        }
    );

    let records = corpus.records().await;
    assert!(records[1].embedding.is_some());
    assert!(records[2].embedding.is_none());

    // A second pass only retries the failure.
    let report = backfill_embeddings(&corpus, &embedder).await.unwrap();
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn backfill_unblocks_clustering() {
    let mut records: Vec<MemoryRecord> = (0..5)
        .map(|i| MemoryRecord::new(format!("m{i}"), format!("hiking trail number{i}"), now()))
        .collect();
    records.push(MemoryRecord::new("x", "quantum chromodynamics lecture", now()));
    let harness = TestHarness::builder().with_memories(records).at(now()).build().await.unwrap();

    assert!(harness.pipeline.run(Default::default()).await.is_err());

    let report = backfill_embeddings(harness.store.as_ref(), harness.embedder.as_ref())
        .await
        .unwrap();
    assert_eq!(report.embedded, 6);

    let result = harness.pipeline.run(Default::default()).await.unwrap();
    assert_eq!(result.member_count(), 6);
}
