// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `memsift cluster` command implementation.
//!
//! Runs the clustering pipeline against the configured store and prints the
//! clusters in review order, the outliers last.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use memsift_config::model::MemsiftConfig;
use memsift_core::{Clock, MemsiftError, SystemClock};
use memsift_memory::{
    backfill_embeddings, Cluster, ClusteringOptions, ClusteringPipeline, ClusteringResult,
    HashingEmbedder, MemoryStore, Tokenizer, HASHING_DIM,
};

/// Run the `memsift cluster` command.
pub async fn run_cluster(
    config: &MemsiftConfig,
    backfill: bool,
    json: bool,
) -> Result<(), MemsiftError> {
    let result = cluster_store(config, backfill).await?;

    if json {
        let rendered = serde_json::to_string_pretty(result.as_ref())
            .map_err(|e| MemsiftError::Internal(format!("failed to serialize clusters: {e}")))?;
        println!("{rendered}");
    } else {
        print!("{}", render_clusters(&result, std::io::stdout().is_terminal()));
    }
    Ok(())
}

/// Open the store, optionally backfill embeddings, and cluster everything.
pub async fn cluster_store(
    config: &MemsiftConfig,
    backfill: bool,
) -> Result<Arc<ClusteringResult>, MemsiftError> {
    let store = Arc::new(MemoryStore::from_config(&config.storage).await?);
    let tokenizer = Arc::new(Tokenizer::from_config(&config.clustering)?);

    if backfill {
        let embedder = HashingEmbedder::new(Arc::clone(&tokenizer), HASHING_DIM)?;
        let report = backfill_embeddings(store.as_ref(), &embedder).await?;
        eprintln!(
            "memsift: embedded {} memories ({} failed, {} already embedded)",
            report.embedded, report.failed, report.skipped
        );
    }

    let options = ClusteringOptions::from_config(&config.clustering)?;
    let pipeline = ClusteringPipeline::new(store, Arc::new(SystemClock) as Arc<dyn Clock>, tokenizer)
        .with_auto_reset(Duration::from_secs(config.clustering.auto_reset_secs));
    pipeline.run(options).await
}

/// Human-readable listing: clusters by priority, then outliers.
fn render_clusters(result: &ClusteringResult, use_color: bool) -> String {
    let mut out = String::new();
    let outlier_count = result.outliers.as_ref().map_or(0, Cluster::len);
    let _ = writeln!(
        out,
        "\n  {} memories, {} clusters, {} outliers",
        result.total_memories,
        result.clusters.len(),
        outlier_count
    );
    let _ = writeln!(out, "  {}", "-".repeat(35));

    for cluster in result.by_priority() {
        render_cluster(&mut out, cluster, use_color);
    }
    if let Some(outliers) = &result.outliers {
        render_cluster(&mut out, outliers, use_color);
    }
    out
}

fn render_cluster(out: &mut String, cluster: &Cluster, use_color: bool) {
    let title = if cluster.is_outliers() {
        format!("Outliers ({})", cluster.len())
    } else {
        format!(
            "Cluster {} ({}) priority {:.2}, density {:.2}, diversity {:.2}, avg age {}d",
            cluster.id,
            cluster.len(),
            cluster.priority_score,
            cluster.density,
            cluster.diversity,
            cluster.avg_age_days
        )
    };

    if use_color {
        use colored::Colorize;
        let _ = writeln!(out, "\n  {}", title.bold());
    } else {
        let _ = writeln!(out, "\n  {title}");
    }
    for member in &cluster.members {
        let _ = writeln!(out, "    - [{}] {}", member.id(), member.fact());
    }
}
