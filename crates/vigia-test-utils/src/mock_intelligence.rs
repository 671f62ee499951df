// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock analysis adapter for deterministic testing.
//!
//! `MockIntelligence` implements `IntelligenceAdapter` with pre-scripted
//! outputs, enabling fast, CI-runnable pipeline tests without an external
//! analysis service.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use vigia_core::types::{AnalysisOutput, AnalysisRequest};
use vigia_core::{IntelligenceAdapter, VigiaError};

/// A scripted analysis adapter.
///
/// Responses are popped from a FIFO queue; an exhausted queue returns the
/// empty output (a quiet batch). Every received request is captured for
/// assertions.
pub struct MockIntelligence {
    responses: Arc<Mutex<VecDeque<Result<AnalysisOutput, String>>>>,
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl MockIntelligence {
    /// Create a mock with an empty script (every call returns quiet output).
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that returns the given output on the first call.
    pub fn with_output(output: AnalysisOutput) -> Self {
        let mock = Self::new();
        let responses = Arc::clone(&mock.responses);
        // A fresh mock has no other handles; try_lock cannot fail here.
        responses.try_lock().unwrap().push_back(Ok(output));
        mock
    }

    /// Queue an output for a future call.
    pub async fn push_output(&self, output: AnalysisOutput) {
        self.responses.lock().await.push_back(Ok(output));
    }

    /// Queue a failure for a future call.
    pub async fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .await
            .push_back(Err(message.to_string()));
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockIntelligence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntelligenceAdapter for MockIntelligence {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, VigiaError> {
        self.requests.lock().await.push(request.clone());
        match self.responses.lock().await.pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(VigiaError::Intelligence {
                message,
                source: None,
            }),
            None => Ok(AnalysisOutput::default()),
        }
    }
}
