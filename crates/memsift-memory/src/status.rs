// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Observable clustering status.
//!
//! The status lives in a `tokio::sync::watch` channel: every update replaces
//! the whole snapshot, so readers never see a half-written state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::ClusteringResult;

/// State of the clustering job.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ClusteringStatus {
    #[default]
    Idle,
    Processing {
        /// Percent complete, `0..=100`.
        progress: u8,
        step: String,
    },
    Completed(Arc<ClusteringResult>),
    /// Human-readable failure reason.
    Failed(String),
}

impl ClusteringStatus {
    /// `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Progress percentage; 100 once completed, 0 when idle or failed.
    pub fn progress(&self) -> u8 {
        match self {
            Self::Processing { progress, .. } => *progress,
            Self::Completed(_) => 100,
            Self::Idle | Self::Failed(_) => 0,
        }
    }
}

/// Shared handle to the status channel. Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    tx: Arc<watch::Sender<ClusteringStatus>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ClusteringStatus::Idle);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<ClusteringStatus> {
        self.tx.subscribe()
    }

    /// Snapshot of the current status.
    pub fn current(&self) -> ClusteringStatus {
        self.tx.borrow().clone()
    }

    /// Replace the status, whether or not anyone is listening.
    pub fn publish(&self, status: ClusteringStatus) {
        self.tx.send_replace(status);
    }

    /// Caller-driven reset back to `Idle`.
    pub fn reset(&self) {
        self.publish(ClusteringStatus::Idle);
    }

    /// Reset to `Idle` only if the status is still terminal.
    ///
    /// Returns whether the reset happened. Checked and applied under the
    /// channel lock, so a run that has already moved to `Processing` is left
    /// untouched.
    pub fn reset_if_terminal(&self) -> bool {
        self.tx.send_if_modified(|status| {
            if status.is_terminal() {
                *status = ClusteringStatus::Idle;
                true
            } else {
                false
            }
        })
    }
}

impl Default for StatusHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes `Processing` updates, suppressing any that would move progress
/// backwards or repeat the last value.
#[derive(Debug)]
pub struct ProgressReporter {
    status: StatusHandle,
    last: Option<u8>,
}

impl ProgressReporter {
    pub fn new(status: StatusHandle) -> Self {
        Self { status, last: None }
    }

    pub fn report(&mut self, progress: u8, step: &str) {
        let progress = progress.min(100);
        if self.last.is_some_and(|last| progress <= last) {
            return;
        }
        self.last = Some(progress);
        self.status.publish(ClusteringStatus::Processing {
            progress,
            step: step.to_string(),
        });
    }
}
