// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; nothing is collected until the host installs
//! a recorder.

use metrics::{describe_counter, describe_histogram};

/// Register all memsift metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "memsift_clustering_runs_total",
        "Clustering runs by outcome"
    );
    describe_histogram!(
        "memsift_clustering_duration_seconds",
        "Wall time of a clustering run in seconds"
    );
    describe_counter!(
        "memsift_retrieval_queries_total",
        "Semantic retrieval queries served"
    );
    describe_counter!(
        "memsift_embedding_parse_failures_total",
        "Stored embeddings that could not be parsed"
    );
}

/// Record a finished clustering run.
pub fn record_clustering_run(outcome: &'static str, seconds: f64) {
    metrics::counter!("memsift_clustering_runs_total", "outcome" => outcome).increment(1);
    metrics::histogram!("memsift_clustering_duration_seconds").record(seconds);
}

/// Record a retrieval query.
pub fn record_retrieval_query() {
    metrics::counter!("memsift_retrieval_queries_total").increment(1);
}

/// Record an unreadable stored embedding.
pub fn record_embedding_parse_failure() {
    metrics::counter!("memsift_embedding_parse_failures_total").increment(1);
}
