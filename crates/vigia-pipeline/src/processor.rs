// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch processor: the pipeline's coordination core.
//!
//! One invocation drives one batch through claim, context fetch, the single
//! analysis call, fan-out, and finalize. Failure handling is deliberately
//! asymmetric: selection, context-fetch, and analysis failures are fatal
//! for the invocation (analysis failure also flips the batch to `error`),
//! while individual fan-out write failures are logged and the batch still
//! reaches `done` -- a degraded success.

use std::sync::Arc;

use tracing::{error, info, warn};

use vigia_core::types::{
    AgentPreset, AnalysisMessage, AnalysisRequest, MessageBatch, OrganizationContext,
};
use vigia_core::{IntelligenceAdapter, StorageAdapter, VigiaError};

use crate::fanout::{FanOutPersister, FanOutReport};

/// Outcome of one processing invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// No pending batch exists. An expected idle state, not an error.
    NoPendingWork,
    /// Another invocation claimed the batch first; this one aborted cleanly.
    LostClaim { batch_id: String },
    /// The batch was processed and finalized `done`.
    Completed {
        batch_id: String,
        report: FanOutReport,
    },
}

/// Drives batches through the `pending -> processing -> done | error`
/// lifecycle.
pub struct BatchProcessor {
    storage: Arc<dyn StorageAdapter>,
    intelligence: Arc<dyn IntelligenceAdapter>,
    fanout: FanOutPersister,
    model: String,
}

impl BatchProcessor {
    /// The model identifier is injected at construction alongside the
    /// clients, so tests can substitute both.
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        intelligence: Arc<dyn IntelligenceAdapter>,
        model: String,
    ) -> Self {
        let fanout = FanOutPersister::new(Arc::clone(&storage));
        Self {
            storage,
            intelligence,
            fanout,
            model,
        }
    }

    /// Process the oldest pending batch, if any.
    pub async fn process_next(&self) -> Result<ProcessOutcome, VigiaError> {
        match self.storage.next_pending_batch().await? {
            Some(batch) => self.run(batch).await,
            None => Ok(ProcessOutcome::NoPendingWork),
        }
    }

    /// Process one specific batch by id.
    pub async fn process(&self, batch_id: &str) -> Result<ProcessOutcome, VigiaError> {
        match self.storage.get_batch(batch_id).await? {
            Some(batch) => self.run(batch).await,
            None => Err(VigiaError::NotFound {
                entity: "batch".to_string(),
                id: batch_id.to_string(),
            }),
        }
    }

    async fn run(&self, batch: MessageBatch) -> Result<ProcessOutcome, VigiaError> {
        // Atomic claim: conditional update on status. Zero rows affected
        // means another invocation won the race -- abort cleanly.
        if !self.storage.claim_batch(&batch.id).await? {
            info!(batch_id = %batch.id, "lost claim race, skipping");
            return Ok(ProcessOutcome::LostClaim { batch_id: batch.id });
        }

        // Context fetch. A failure here aborts before the analysis call and
        // leaves the batch in `processing`; the janitor reclaims it later.
        let context = self
            .storage
            .group_context(&batch.group_id)
            .await?
            .ok_or_else(|| VigiaError::NotFound {
                entity: "group".to_string(),
                id: batch.group_id.clone(),
            })?;
        let messages = self.storage.messages_for_batch(&batch.id).await?;
        let admins = self
            .storage
            .organization_admins(&batch.organization_id)
            .await?;

        let request = AnalysisRequest {
            batch_id: batch.id.clone(),
            organization_id: batch.organization_id.clone(),
            group_name: context.group.name.clone(),
            model: self.model.clone(),
            agent_preset: AgentPreset {
                name: context.group.preset_name.clone(),
                description: context.group.preset_description.clone(),
            },
            organization_context: OrganizationContext {
                name: context.organization.name.clone(),
                plan: context.organization.plan.clone(),
            },
            messages: messages
                .iter()
                .map(|m| AnalysisMessage {
                    id: m.id.clone(),
                    author: m.author_hash.clone(),
                    text: m.content_text.clone(),
                    timestamp: m.message_ts.clone(),
                })
                .collect(),
        };

        // The single analysis call. This precedes all persistence, so a
        // failure aborts the batch without partial writes.
        let output = match self.intelligence.analyze(&request).await {
            Ok(output) => output,
            Err(e) => {
                error!(batch_id = %batch.id, error = %e, "analysis call failed");
                if let Err(fe) = self.storage.finalize_error(&batch.id, &e.to_string()).await {
                    warn!(batch_id = %batch.id, error = %fe, "failed to record batch error");
                }
                return Err(e);
            }
        };

        // Fan-out never fails; individual step failures are logged inside.
        let report = self.fanout.persist(&batch, &context, &admins, &output).await;

        // The analysis call succeeded, so the batch is done even if some
        // persistence steps degraded.
        self.storage.finalize_done(&batch.id).await?;
        info!(
            batch_id = %batch.id,
            alerts = report.alerts_inserted,
            urgent = report.urgent_notifications,
            summary = report.summary_inserted,
            analytics = report.analytics_upserted,
            "batch processed"
        );

        Ok(ProcessOutcome::Completed {
            batch_id: batch.id,
            report,
        })
    }
}
