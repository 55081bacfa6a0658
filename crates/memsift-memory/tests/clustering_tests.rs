// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clustering over synthetic corpora: themed scenarios, boundary thresholds
//! and partition properties.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use memsift_core::Clock;
use memsift_memory::{
    cluster_memories, ClusteringOptions, ClusteringPipeline, ClusteringResult, MemoryRecord,
    MemoryWithAge, SizeRange, Tokenizer, OUTLIER_CLUSTER_ID,
};
use memsift_test_utils::{FixedClock, InMemoryCorpus, ThemedCorpus};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
}

fn pipeline_over(records: Vec<MemoryRecord>) -> ClusteringPipeline {
    ClusteringPipeline::new(
        Arc::new(InMemoryCorpus::new(records)),
        Arc::new(FixedClock::new(now())) as Arc<dyn Clock>,
        Arc::new(Tokenizer::default()),
    )
}

fn cluster_ids(result: &ClusteringResult) -> Vec<Vec<String>> {
    result
        .clusters
        .iter()
        .map(|c| c.member_ids().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn two_themes_and_a_stray_memory() {
    let records = ThemedCorpus::new(now()).group(5).group(5).isolated(1).build();
    assert_eq!(records.len(), 11);

    let result = pipeline_over(records)
        .cluster(SizeRange::new(5, 10).unwrap(), 0.6)
        .await
        .unwrap();

    assert_eq!(result.total_memories, 11);
    assert_eq!(result.clusters.len(), 2);
    assert_eq!(
        cluster_ids(&result),
        vec![
            vec!["g0-m0", "g0-m1", "g0-m2", "g0-m3", "g0-m4"],
            vec!["g1-m0", "g1-m1", "g1-m2", "g1-m3", "g1-m4"],
        ]
    );
    assert_eq!(result.clusters[0].id, 0);
    assert_eq!(result.clusters[1].id, 1);

    let outliers = result.outliers.as_ref().unwrap();
    assert_eq!(outliers.id, OUTLIER_CLUSTER_ID);
    assert_eq!(outliers.member_ids().collect::<Vec<_>>(), vec!["iso-0"]);
    assert_eq!(outliers.diversity, 0.0);
}

#[tokio::test]
async fn themed_clusters_are_dense() {
    let records = ThemedCorpus::new(now()).group(6).intra(0.8).aged(45).build();
    let result = pipeline_over(records).run(ClusteringOptions::default()).await.unwrap();

    assert_eq!(result.clusters.len(), 1);
    let cluster = &result.clusters[0];
    assert_eq!(cluster.avg_age_days, 45);
    assert!(cluster.density > 0.8, "density {}", cluster.density);
    assert!(cluster.diversity > 0.1 && cluster.diversity < 0.3, "diversity {}", cluster.diversity);
    assert!(result.outliers.is_none());
}

#[tokio::test]
async fn zero_threshold_merges_then_splits_by_size() {
    let records = ThemedCorpus::new(now()).group(5).group(5).isolated(1).build();

    let result = pipeline_over(records)
        .cluster(SizeRange::new(5, 10).unwrap(), 0.0)
        .await
        .unwrap();

    // One coarse group of 11 is split round-robin into 6 + 5.
    let sizes: Vec<usize> = result.clusters.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![6, 5]);
    assert!(result.outliers.is_none());
    assert_eq!(result.member_count(), 11);
}

#[tokio::test]
async fn threshold_one_leaves_only_outliers() {
    let records = ThemedCorpus::new(now()).group(4).group(3).build();

    let result = pipeline_over(records)
        .cluster(SizeRange::new(2, 10).unwrap(), 1.0)
        .await
        .unwrap();

    assert!(result.clusters.is_empty());
    assert_eq!(result.outliers.as_ref().map(|o| o.len()), Some(7));
}

#[tokio::test]
async fn small_coarse_groups_are_kept_below_min_size() {
    let records = ThemedCorpus::new(now()).group(3).group(2).build();

    let result = pipeline_over(records)
        .cluster(SizeRange::new(5, 10).unwrap(), 0.6)
        .await
        .unwrap();

    let sizes: Vec<usize> = result.clusters.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![3, 2]);
    assert!(result.outliers.is_none());
}

#[tokio::test]
async fn oversized_theme_loses_small_remainders_to_outliers() {
    // 12 members with max 5 split into 3 groups of 4, all below min 5.
    let records = ThemedCorpus::new(now()).group(12).build();

    let result = pipeline_over(records)
        .cluster(SizeRange::new(5, 5).unwrap(), 0.6)
        .await
        .unwrap();

    assert!(result.clusters.is_empty());
    assert_eq!(result.outliers.as_ref().map(|o| o.len()), Some(12));
}

#[tokio::test]
async fn young_dense_cluster_ranks_first_for_review() {
    let mut records = ThemedCorpus::new(now()).group(5).aged(10).build();
    let old = ThemedCorpus::new(now()).group(5).aged(80).build();
    // Same geometry, so rename the second theme and push it onto its own axes.
    records.extend(old.into_iter().map(|mut r| {
        r.id = r.id.replace("g0", "old");
        r.fact = r.fact.replace("theme0", "archive");
        let mut embedding = vec![0.0; 7];
        embedding.extend(r.embedding.take().unwrap());
        r.embedding = Some(embedding);
        r
    }));
    for record in records.iter_mut().take(5) {
        record.embedding.as_mut().unwrap().extend(vec![0.0; 7]);
    }

    let result = pipeline_over(records).run(ClusteringOptions::default()).await.unwrap();
    assert_eq!(result.clusters.len(), 2);

    let ranked = result.by_priority();
    assert_eq!(ranked[0].avg_age_days, 10);
    assert_eq!(ranked[1].avg_age_days, 80);
    assert!(ranked[0].priority_score > ranked[1].priority_score);
}

fn views(embeddings: &[Vec<f32>]) -> Vec<MemoryWithAge> {
    embeddings
        .iter()
        .enumerate()
        .map(|(i, embedding)| MemoryWithAge {
            memory: MemoryRecord::new(format!("m{i}"), format!("note {i}"), now()),
            age_days: (i as i64 * 7) % 120,
            embedding: embedding.clone(),
        })
        .collect()
}

fn run(embeddings: &[Vec<f32>], options: &ClusteringOptions) -> ClusteringResult {
    let tokenizer = Tokenizer::new(HashSet::new(), 4);
    cluster_memories(views(embeddings), &tokenizer, options, &mut |_: u8, _: &str| {})
}

fn options_strategy() -> impl Strategy<Value = ClusteringOptions> {
    (1usize..5, 0usize..6, 0.0f64..=1.0).prop_map(|(min, extra, threshold)| ClusteringOptions {
        size_range: SizeRange::new(min, min + extra).unwrap(),
        threshold,
        ..ClusteringOptions::default()
    })
}

fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<f32>>> {
    prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 3), 1..30)
}

proptest! {
    #[test]
    fn every_memory_lands_exactly_once(
        embeddings in corpus_strategy(),
        options in options_strategy(),
    ) {
        let result = run(&embeddings, &options);

        prop_assert_eq!(result.total_memories, embeddings.len());
        prop_assert_eq!(result.member_count(), embeddings.len());

        let mut seen = HashSet::new();
        for cluster in result.clusters.iter().chain(result.outliers.iter()) {
            prop_assert!(!cluster.is_empty());
            for id in cluster.member_ids() {
                prop_assert!(seen.insert(id.to_string()), "{} placed twice", id);
            }
        }
    }

    #[test]
    fn clusters_respect_the_size_ceiling(
        embeddings in corpus_strategy(),
        options in options_strategy(),
    ) {
        let result = run(&embeddings, &options);
        let max = options.size_range.max();

        for (index, cluster) in result.clusters.iter().enumerate() {
            prop_assert_eq!(cluster.id, index as i64);
            prop_assert!(cluster.len() <= max);
            prop_assert!(cluster.len() > 1, "cluster {} holds a single memory", cluster.id);
        }
        if let Some(outliers) = &result.outliers {
            prop_assert_eq!(outliers.id, OUTLIER_CLUSTER_ID);
        }
    }

    #[test]
    fn metrics_stay_in_range(embeddings in corpus_strategy(), options in options_strategy()) {
        let result = run(&embeddings, &options);

        for cluster in result.clusters.iter().chain(result.outliers.iter()) {
            prop_assert!((0.0..=1.0).contains(&cluster.priority_score));
            prop_assert!((0.0..=2.0).contains(&cluster.diversity));
            prop_assert!(cluster.density >= -1.0 - 1e-9 && cluster.density <= 1.0 + 1e-9);
            prop_assert!(cluster.avg_age_days >= 0);
        }
    }

    #[test]
    fn clustering_is_deterministic(embeddings in corpus_strategy(), options in options_strategy()) {
        prop_assert_eq!(run(&embeddings, &options), run(&embeddings, &options));
    }
}
