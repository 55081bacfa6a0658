// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for memsift.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level memsift configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemsiftConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Memory store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Batch clustering settings.
    #[serde(default)]
    pub clustering: ClusteringConfig,

    /// Query-time retrieval settings.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite memory store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("memsift/memsift.db").display().to_string())
        .unwrap_or_else(|| "memsift.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Batch clustering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClusteringConfig {
    /// Lower bound of the target cluster size range.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Upper bound of the target cluster size range. Larger groups are split.
    #[serde(default = "default_max_cluster_size")]
    pub max_cluster_size: usize,

    /// Hybrid similarity a candidate needs to join a growing group (0.0-1.0).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Multiplier applied to mean keyword overlap before it is added to
    /// embedding similarity.
    #[serde(default = "default_keyword_boost")]
    pub keyword_boost: f64,

    /// Minimum token length in characters for the keyword signal.
    #[serde(default = "default_min_token_chars")]
    pub min_token_chars: usize,

    /// Optional stop-word list replacing the bundled one (one word per line).
    #[serde(default)]
    pub stop_words_file: Option<String>,

    /// Seconds after a finished run before the status returns to idle.
    /// Zero leaves the reset to the caller.
    #[serde(default)]
    pub auto_reset_secs: u64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: default_min_cluster_size(),
            max_cluster_size: default_max_cluster_size(),
            similarity_threshold: default_similarity_threshold(),
            keyword_boost: default_keyword_boost(),
            min_token_chars: default_min_token_chars(),
            stop_words_file: None,
            auto_reset_secs: 0,
        }
    }
}

fn default_min_cluster_size() -> usize {
    5
}

fn default_max_cluster_size() -> usize {
    10
}

fn default_similarity_threshold() -> f64 {
    0.60
}

fn default_keyword_boost() -> f64 {
    0.2
}

fn default_min_token_chars() -> usize {
    4
}

/// Query-time retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    /// Number of memories returned per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates younger than this many days are excluded.
    #[serde(default)]
    pub min_age_days: i64,

    /// Embed candidates that lack a stored vector on demand (not persisted).
    #[serde(default)]
    pub embed_missing: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_age_days: 0,
            embed_missing: false,
        }
    }
}

fn default_top_k() -> usize {
    5
}
