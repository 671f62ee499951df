// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Vigia pipeline.
//!
//! All adapters use `#[async_trait]` for dynamic dispatch compatibility;
//! pipeline components hold them as `Arc<dyn ...>` so tests can substitute
//! mocks.

pub mod intelligence;
pub mod storage;

pub use intelligence::IntelligenceAdapter;
pub use storage::StorageAdapter;
