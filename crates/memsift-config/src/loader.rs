// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./memsift.toml` > `~/.config/memsift/memsift.toml` > `/etc/memsift/memsift.toml`
//! with environment variable overrides via `MEMSIFT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MemsiftConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/memsift/memsift.toml";

/// Local configuration file, resolved against the working directory.
pub const LOCAL_CONFIG_FILE: &str = "memsift.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/memsift/memsift.toml` (system-wide)
/// 3. `~/.config/memsift/memsift.toml` (user XDG config)
/// 4. `./memsift.toml` (local directory)
/// 5. `MEMSIFT_*` environment variables
pub fn load_config() -> Result<MemsiftConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MemsiftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemsiftConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MemsiftConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MemsiftConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MemsiftConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Path of the per-user configuration file, if a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("memsift/memsift.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MEMSIFT_CLUSTERING_MIN_CLUSTER_SIZE` must map to
/// `clustering.min_cluster_size`, not `clustering.min.cluster.size`.
fn env_provider() -> Env {
    Env::prefixed("MEMSIFT_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("general_", "general.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("clustering_", "clustering.", 1)
            .replacen("retrieval_", "retrieval.", 1);
        mapped.into()
    })
}
