// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for memsift.
//!
//! This crate provides the error taxonomy, the collaborator traits
//! (embedding provider, clock) and the common types shared by the
//! clustering and retrieval crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MemsiftError;
pub use types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

pub use traits::{Clock, EmbeddingAdapter, PluginAdapter, SystemClock};
