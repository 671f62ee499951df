// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reqwest-based client for the external batch-analysis service.
//!
//! Implements [`vigia_core::IntelligenceAdapter`] over HTTP with
//! configuration (endpoint, API key, model, timeout) injected at
//! construction.

pub mod client;

pub use client::AnalysisClient;
