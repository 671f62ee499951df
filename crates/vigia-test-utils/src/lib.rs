// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vigia integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests
//! without external services.
//!
//! # Components
//!
//! - [`MockIntelligence`] - Scripted analysis adapter with request capture
//! - [`FailingStorage`] - Delegating storage wrapper that fails selected
//!   operations, for partial-failure tests

pub mod failing_storage;
pub mod mock_intelligence;

pub use failing_storage::FailingStorage;
pub use mock_intelligence::MockIntelligence;
