// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the clustering and retrieval core.
//!
//! Adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod clock;
pub mod embedding;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use embedding::EmbeddingAdapter;
