// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external batch-analysis service.
//!
//! Provides [`AnalysisClient`] which handles request construction,
//! authentication, and response parsing. The contract is a single call per
//! batch: timeout, non-2xx status, and malformed bodies are all fatal for
//! the batch being processed, so no retry happens at this layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::debug;

use vigia_config::model::IntelligenceConfig;
use vigia_core::types::{AnalysisOutput, AnalysisRequest};
use vigia_core::{IntelligenceAdapter, VigiaError};

/// Path of the batch-analysis endpoint relative to the configured base URL.
const ANALYZE_PATH: &str = "/v1/analyze-batch";

/// HTTP client for the analysis service.
///
/// All parameters (base URL, API key, model, timeout) are fixed at
/// construction from [`IntelligenceConfig`]; nothing is re-read per call.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl AnalysisClient {
    /// Creates a new analysis service client from configuration.
    pub fn new(config: &IntelligenceConfig) -> Result<Self, VigiaError> {
        let mut headers = HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = format!("Bearer {api_key}");
            headers.insert(
                "authorization",
                HeaderValue::from_str(&value).map_err(|e| {
                    VigiaError::Config(format!("invalid API key header value: {e}"))
                })?,
            );
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VigiaError::Intelligence {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let endpoint = format!("{}{ANALYZE_PATH}", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
        })
    }

    /// Returns the model identifier forwarded with each request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl IntelligenceAdapter for AnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, VigiaError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| VigiaError::Intelligence {
                message: format!("analysis request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, batch_id = %request.batch_id, "analysis response received");

        // The response body is kept in the error message for diagnosis;
        // it also ends up in the batch's error column.
        let body = response.text().await.map_err(|e| VigiaError::Intelligence {
            message: format!("failed to read analysis response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(VigiaError::Intelligence {
                message: format!("analysis service returned {status}: {body}"),
                source: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| VigiaError::Intelligence {
            message: format!("failed to parse analysis response: {e}: {body}"),
            source: Some(Box::new(e)),
        })
    }
}
