// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intelligence adapter trait for the external batch-analysis service.

use async_trait::async_trait;

use crate::error::VigiaError;
use crate::types::{AnalysisOutput, AnalysisRequest};

/// Adapter for the external AI analysis service.
///
/// The contract is one call per batch: the call either returns structured
/// output or fails, and a failure is fatal for the batch being processed.
/// No retry is attempted at this layer.
#[async_trait]
pub trait IntelligenceAdapter: Send + Sync {
    /// Sends one assembled batch payload and returns the structured output.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, VigiaError>;
}
