// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staged clustering job with observable progress.
//!
//! Stages and their progress checkpoints:
//!
//! | Stage                | Progress |
//! |----------------------|----------|
//! | load memories        | 5        |
//! | validate embeddings  | 20       |
//! | coarse clustering    | 30..60   |
//! | refinement           | 60..90   |
//! | metrics              | 90..100  |
//!
//! An empty corpus or any memory without a usable embedding fails the run
//! before clustering starts. Runs are serialized; the CPU-bound stages run on
//! the blocking pool and cannot be cancelled once started.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use memsift_config::model::ClusteringConfig;
use memsift_core::{Clock, MemsiftError};

use crate::cluster_metrics::build_cluster;
use crate::clusterer::{coarse_cluster, DEFAULT_SIMILARITY_THRESHOLD};
use crate::recording;
use crate::refiner::{refine, SizeRange};
use crate::similarity::{HybridScorer, ScoringInput, DEFAULT_KEYWORD_BOOST};
use crate::status::{ClusteringStatus, ProgressReporter, StatusHandle};
use crate::store::MemoryCorpus;
use crate::tokenizer::Tokenizer;
use crate::types::{ClusteringResult, MemoryWithAge, OUTLIER_CLUSTER_ID};

/// Tunables for one clustering run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringOptions {
    pub size_range: SizeRange,
    pub threshold: f64,
    pub keyword_boost: f64,
}

impl ClusteringOptions {
    pub fn from_config(config: &ClusteringConfig) -> Result<Self, MemsiftError> {
        Ok(Self {
            size_range: SizeRange::new(config.min_cluster_size, config.max_cluster_size)?,
            threshold: config.similarity_threshold,
            keyword_boost: config.keyword_boost,
        })
    }
}

impl Default for ClusteringOptions {
    fn default() -> Self {
        Self {
            size_range: SizeRange::default(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            keyword_boost: DEFAULT_KEYWORD_BOOST,
        }
    }
}

/// Runs clustering over a corpus and publishes its status.
pub struct ClusteringPipeline {
    corpus: Arc<dyn MemoryCorpus>,
    clock: Arc<dyn Clock>,
    tokenizer: Arc<Tokenizer>,
    status: StatusHandle,
    run_lock: Mutex<()>,
    run_seq: Arc<AtomicU64>,
    auto_reset: Option<Duration>,
}

impl ClusteringPipeline {
    pub fn new(corpus: Arc<dyn MemoryCorpus>, clock: Arc<dyn Clock>, tokenizer: Arc<Tokenizer>) -> Self {
        Self {
            corpus,
            clock,
            tokenizer,
            status: StatusHandle::new(),
            run_lock: Mutex::new(()),
            run_seq: Arc::new(AtomicU64::new(0)),
            auto_reset: None,
        }
    }

    /// Return to `Idle` this long after a run ends, unless another run has
    /// started since. A zero duration disables the reset.
    pub fn with_auto_reset(mut self, delay: Duration) -> Self {
        self.auto_reset = (!delay.is_zero()).then_some(delay);
        self
    }

    pub fn status(&self) -> &StatusHandle {
        &self.status
    }

    pub fn subscribe(&self) -> watch::Receiver<ClusteringStatus> {
        self.status.subscribe()
    }

    /// Caller-driven reset, e.g. when a results view is closed.
    pub fn reset(&self) {
        self.status.reset();
    }

    /// Cluster with a size range and threshold, other options at defaults.
    pub async fn cluster(
        &self,
        size_range: SizeRange,
        threshold: f64,
    ) -> Result<Arc<ClusteringResult>, MemsiftError> {
        self.run(ClusteringOptions {
            size_range,
            threshold,
            ..ClusteringOptions::default()
        })
        .await
    }

    /// Run the full pipeline. Concurrent callers wait their turn.
    ///
    /// The outcome is both returned and published as `Completed` or `Failed`.
    pub async fn run(&self, options: ClusteringOptions) -> Result<Arc<ClusteringResult>, MemsiftError> {
        let _guard = self.run_lock.lock().await;
        let seq = self.run_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        info!(
            threshold = options.threshold,
            min_size = options.size_range.min(),
            max_size = options.size_range.max(),
            "clustering run started"
        );

        let outcome = self.execute(options).await;
        let elapsed = started.elapsed();

        match &outcome {
            Ok(result) => {
                info!(
                    clusters = result.clusters.len(),
                    outliers = result.outliers.as_ref().map_or(0, |o| o.len()),
                    total = result.total_memories,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "clustering run completed"
                );
                recording::record_clustering_run("completed", elapsed.as_secs_f64());
                self.status.publish(ClusteringStatus::Completed(Arc::clone(result)));
            }
            Err(e) => {
                warn!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "clustering run failed");
                recording::record_clustering_run("failed", elapsed.as_secs_f64());
                self.status.publish(ClusteringStatus::Failed(e.to_string()));
            }
        }

        self.schedule_reset(seq);
        outcome
    }

    async fn execute(&self, options: ClusteringOptions) -> Result<Arc<ClusteringResult>, MemsiftError> {
        let mut reporter = ProgressReporter::new(self.status.clone());

        reporter.report(5, "Loading memories");
        let records = self.corpus.load_memories().await?;
        if records.is_empty() {
            return Err(MemsiftError::EmptyCorpus);
        }

        reporter.report(20, "Validating embeddings");
        let missing = records.iter().filter(|r| r.embedding.is_none()).count();
        if missing > 0 {
            return Err(MemsiftError::MissingEmbeddings { count: missing });
        }
        let now = self.clock.now();
        let memories = records
            .into_iter()
            .map(|record| MemoryWithAge::from_record(record, now))
            .collect::<Result<Vec<_>, _>>()?;
        check_dimensions(&memories)?;
        debug!(count = memories.len(), "embeddings validated");

        let tokenizer = Arc::clone(&self.tokenizer);
        let result = tokio::task::spawn_blocking(move || {
            cluster_memories(memories, &tokenizer, &options, &mut |progress: u8, step: &str| {
                reporter.report(progress, step)
            })
        })
        .await
        .map_err(|e| MemsiftError::Internal(format!("clustering worker failed: {e}")))?;

        Ok(Arc::new(result))
    }

    fn schedule_reset(&self, seq: u64) {
        let Some(delay) = self.auto_reset else {
            return;
        };
        let status = self.status.clone();
        let run_seq = Arc::clone(&self.run_seq);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if run_seq.load(Ordering::SeqCst) == seq && status.reset_if_terminal() {
                debug!("clustering status reset to idle");
            }
        });
    }
}

fn check_dimensions(memories: &[MemoryWithAge]) -> Result<(), MemsiftError> {
    let Some(first) = memories.first() else {
        return Ok(());
    };
    let expected = first.embedding.len();
    match memories.iter().find(|m| m.embedding.len() != expected) {
        Some(odd) => Err(MemsiftError::DimensionMismatch {
            expected,
            found: odd.embedding.len(),
        }),
        None => Ok(()),
    }
}

/// Scale `done / total` into `width` percentage points above `base`.
fn stage_progress(base: u8, width: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return base + width;
    }
    let span = (usize::from(width) * done.min(total)) / total;
    base + span as u8
}

/// The CPU-bound part of a run: coarse clustering, refinement and metrics.
///
/// Every memory must carry an embedding of one shared dimensionality.
/// `progress(percent, step)` is called at each checkpoint.
pub fn cluster_memories(
    memories: Vec<MemoryWithAge>,
    tokenizer: &Tokenizer,
    options: &ClusteringOptions,
    progress: &mut dyn FnMut(u8, &str),
) -> ClusteringResult {
    let total_memories = memories.len();
    let scorer = HybridScorer::new(options.keyword_boost);

    progress(30, "Clustering memories");
    let coarse = {
        let inputs: Vec<ScoringInput<'_>> = memories
            .iter()
            .map(|m| ScoringInput::new(&m.embedding, m.fact(), tokenizer))
            .collect();
        coarse_cluster(&inputs, &scorer, options.threshold, |done, total| {
            progress(stage_progress(30, 30, done, total), "Clustering memories")
        })
    };
    debug!(coarse_clusters = coarse.cluster_count, "coarse clustering done");

    progress(60, "Refining clusters");
    let refined = refine(&coarse, options.size_range);
    progress(90, "Computing cluster metrics");

    let mut slots: Vec<Option<MemoryWithAge>> = memories.into_iter().map(Some).collect();
    let cluster_total = refined.clusters.len() + usize::from(!refined.outliers.is_empty());

    let mut clusters = Vec::with_capacity(refined.clusters.len());
    for (index, group) in refined.clusters.iter().enumerate() {
        let members = take_members(&mut slots, group);
        clusters.push(build_cluster(index as i64, members));
        progress(
            stage_progress(90, 10, index + 1, cluster_total),
            "Computing cluster metrics",
        );
    }

    let outliers = (!refined.outliers.is_empty()).then(|| {
        let members = take_members(&mut slots, &refined.outliers);
        build_cluster(OUTLIER_CLUSTER_ID, members)
    });
    progress(100, "Computing cluster metrics");

    ClusteringResult {
        clusters,
        outliers,
        total_memories,
    }
}

fn take_members(slots: &mut [Option<MemoryWithAge>], indices: &[usize]) -> Vec<MemoryWithAge> {
    indices.iter().filter_map(|&i| slots[i].take()).collect()
}
