// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /v1/process-batch, POST /v1/messages, GET /v1/batches/{id},
//! and the public GET /health.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use vigia_core::types::{now_rfc3339, Message};
use vigia_core::VigiaError;
use vigia_pipeline::ProcessOutcome;

use crate::server::GatewayState;

/// Request body for POST /v1/process-batch. The body is optional: an empty
/// POST processes the oldest pending batch.
#[derive(Debug, Default, Deserialize)]
pub struct ProcessBatchRequest {
    /// Target a specific batch instead of the oldest pending one.
    #[serde(default)]
    pub batch_id: Option<String>,
}

/// Success body for POST /v1/process-batch.
#[derive(Debug, Serialize)]
pub struct ProcessBatchResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
pub struct IngestMessageRequest {
    pub group_id: String,
    pub organization_id: String,
    pub author_hash: String,
    pub content_text: String,
    /// Defaults to the ingestion time.
    #[serde(default)]
    pub message_ts: Option<String>,
}

/// Response body for POST /v1/messages.
#[derive(Debug, Serialize)]
pub struct IngestMessageResponse {
    pub id: String,
}

/// Response body for GET /v1/batches/{id}.
#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    pub id: String,
    pub status: String,
    pub start_ts: String,
    pub end_ts: String,
    pub message_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /v1/process-batch
///
/// Processes the oldest pending batch, or a specific one when `batch_id`
/// is given. A missing or malformed body is treated as the empty request.
pub async fn post_process_batch(State(state): State<GatewayState>, body: Bytes) -> Response {
    let request: ProcessBatchRequest = if body.is_empty() {
        ProcessBatchRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_default()
    };

    let result = match request.batch_id.as_deref() {
        Some(batch_id) => state.processor.process(batch_id).await,
        None => state.processor.process_next().await,
    };

    match result {
        Ok(ProcessOutcome::Completed { batch_id, .. }) => (
            StatusCode::OK,
            Json(ProcessBatchResponse {
                message: "Success".to_string(),
                batch_id: Some(batch_id),
            }),
        )
            .into_response(),
        Ok(ProcessOutcome::NoPendingWork) => (
            StatusCode::OK,
            Json(ProcessBatchResponse {
                message: "No batch found to process".to_string(),
                batch_id: None,
            }),
        )
            .into_response(),
        Ok(ProcessOutcome::LostClaim { batch_id }) => (
            StatusCode::OK,
            Json(ProcessBatchResponse {
                message: "Batch already claimed".to_string(),
                batch_id: Some(batch_id),
            }),
        )
            .into_response(),
        // A targeted id that does not exist is "nothing to do", not a 500.
        Err(VigiaError::NotFound { .. }) => (
            StatusCode::OK,
            Json(ProcessBatchResponse {
                message: "No batch found to process".to_string(),
                batch_id: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "batch processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed".to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// POST /v1/messages
///
/// Appends one inbound message to the store.
pub async fn post_messages(
    State(state): State<GatewayState>,
    Json(body): Json<IngestMessageRequest>,
) -> Response {
    let now = now_rfc3339();
    let message = Message {
        id: uuid::Uuid::new_v4().to_string(),
        group_id: body.group_id,
        organization_id: body.organization_id,
        author_hash: body.author_hash,
        content_text: body.content_text,
        message_ts: body.message_ts.unwrap_or_else(|| now.clone()),
        batch_id: None,
        created_at: now,
    };

    match state.storage.insert_message(&message).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(IngestMessageResponse { id: message.id }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "message ingest failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed".to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /v1/batches/{id}
///
/// Returns one batch's lifecycle state.
pub async fn get_batch(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.storage.get_batch(&id).await {
        Ok(Some(batch)) => (
            StatusCode::OK,
            Json(BatchStatusResponse {
                id: batch.id,
                status: batch.status.to_string(),
                start_ts: batch.start_ts,
                end_ts: batch.end_ts,
                message_count: batch.message_count,
                processed_at: batch.processed_at,
                error: batch.error,
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("batch not found: {id}"),
                details: None,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "batch lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed".to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
///
/// Public health endpoint, no auth.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
