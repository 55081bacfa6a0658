// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for memsift integration tests.
//!
//! Provides mock collaborators and test harness infrastructure for fast,
//! deterministic tests without an external embedding provider.
//!
//! # Components
//!
//! - [`MockEmbedder`] - deterministic embedder with scripted vectors and failures
//! - [`FixedClock`] - clock pinned to a chosen instant
//! - [`InMemoryCorpus`] - corpus without SQLite, with switchable load failures
//! - [`ThemedCorpus`] - synthetic corpora with controlled cosine structure
//! - [`TestHarness`] - store, pipeline and retriever wired together

pub mod clock;
pub mod corpus;
pub mod fixtures;
pub mod harness;
pub mod mock_embedder;

pub use clock::FixedClock;
pub use corpus::InMemoryCorpus;
pub use fixtures::{memory_aged, unit_axis, ThemedCorpus};
pub use harness::TestHarness;
pub use mock_embedder::MockEmbedder;
