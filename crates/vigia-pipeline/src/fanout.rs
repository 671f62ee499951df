// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out persistence of analysis output.
//!
//! Translates one [`AnalysisOutput`] into independent writes: alerts,
//! urgent notifications, summary (plus summary delivery), and the analytics
//! upsert. Deliberately best-effort rather than transactional: a partial
//! result (alerts saved but summary failed) is strictly better than
//! discarding everything, so each step is individually caught and logged
//! and the remaining steps still run.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use vigia_core::types::{
    now_rfc3339, AdminContact, Alert, AnalysisOutput, GroupAnalytics, GroupContext,
    MessageBatch, Severity, Summary,
};
use vigia_core::StorageAdapter;

use crate::notify::NotificationDispatcher;

/// What the fan-out actually managed to persist, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub alerts_inserted: usize,
    pub urgent_notifications: usize,
    pub summary_inserted: bool,
    pub summary_notifications: usize,
    pub analytics_upserted: bool,
}

/// Writes analysis output into the store, tolerating per-step failure.
pub struct FanOutPersister {
    storage: Arc<dyn StorageAdapter>,
    dispatcher: NotificationDispatcher,
}

impl FanOutPersister {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        let dispatcher = NotificationDispatcher::new(Arc::clone(&storage));
        Self {
            storage,
            dispatcher,
        }
    }

    /// Persist one batch's analysis output.
    ///
    /// Order: alerts -> urgent notifications -> summary -> analytics. The
    /// order matters only in that notifications read severity from the
    /// alerts that were just inserted. This function never fails; the
    /// report says what succeeded.
    pub async fn persist(
        &self,
        batch: &MessageBatch,
        context: &GroupContext,
        admins: &[AdminContact],
        output: &AnalysisOutput,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();
        let group_name = context.group.name.as_str();

        // 1. Alerts: one row per reported alert, default severity medium,
        //    always open and unread.
        let alerts = build_alerts(batch, output);
        let mut inserted: &[Alert] = &[];
        if !alerts.is_empty() {
            match self.storage.insert_alerts(&alerts).await {
                Ok(()) => {
                    info!(batch_id = %batch.id, count = alerts.len(), "persisted alerts");
                    report.alerts_inserted = alerts.len();
                    inserted = &alerts;
                }
                Err(e) => {
                    error!(batch_id = %batch.id, error = %e, "alert persistence failed");
                }
            }
        }

        // 2. Urgent notifications: first high-severity alert only, one
        //    notification per admin. Depends on the alerts actually being
        //    inserted above.
        if let Some(first_urgent) = inserted.iter().find(|a| a.severity.is_urgent()) {
            report.urgent_notifications = self
                .dispatcher
                .dispatch_urgent(batch, group_name, admins, first_urgent)
                .await;
        }

        // 3. Summary, plus opt-in summary delivery.
        if let Some(summary_text) = output.summary.as_deref().filter(|s| !s.is_empty()) {
            let summary = Summary {
                id: Uuid::new_v4().to_string(),
                organization_id: batch.organization_id.clone(),
                group_id: batch.group_id.clone(),
                batch_id: batch.id.clone(),
                summary_text: summary_text.to_string(),
                period_start: batch.start_ts.clone(),
                period_end: batch.end_ts.clone(),
                is_read: false,
                created_at: now_rfc3339(),
            };
            match self.storage.insert_summary(&summary).await {
                Ok(()) => {
                    info!(batch_id = %batch.id, "persisted summary");
                    report.summary_inserted = true;
                    report.summary_notifications = self
                        .dispatcher
                        .dispatch_summary(batch, group_name, admins, summary_text)
                        .await;
                }
                Err(e) => {
                    error!(batch_id = %batch.id, error = %e, "summary persistence failed");
                }
            }
        }

        // 4. Analytics upsert, keyed by the batch's period. The explicit
        //    Option check matters: 0.0 is a valid sentiment score.
        if let Some(sentiment_score) = output.sentiment_score {
            let analytics = GroupAnalytics {
                id: Uuid::new_v4().to_string(),
                organization_id: batch.organization_id.clone(),
                group_id: batch.group_id.clone(),
                period_start: batch.start_ts.clone(),
                period_end: batch.end_ts.clone(),
                sentiment_score,
                message_count: batch.message_count,
                alert_count_total: report.alerts_inserted as i64,
                created_at: now_rfc3339(),
            };
            match self.storage.upsert_group_analytics(&analytics).await {
                Ok(()) => {
                    info!(batch_id = %batch.id, "persisted group analytics");
                    report.analytics_upserted = true;
                }
                Err(e) => {
                    error!(batch_id = %batch.id, error = %e, "analytics persistence failed");
                }
            }
        }

        report
    }
}

/// Build alert rows from the analysis output, applying defaults.
fn build_alerts(batch: &MessageBatch, output: &AnalysisOutput) -> Vec<Alert> {
    let Some(payloads) = output.alerts.as_ref() else {
        return Vec::new();
    };
    payloads
        .iter()
        .map(|payload| Alert {
            id: Uuid::new_v4().to_string(),
            organization_id: batch.organization_id.clone(),
            group_id: batch.group_id.clone(),
            batch_id: batch.id.clone(),
            title: payload
                .title
                .clone()
                .unwrap_or_else(|| "Intelligence alert".to_string()),
            summary: payload.description.clone().unwrap_or_default(),
            severity: Severity::parse_or_default(payload.severity.as_deref()),
            status: "open".to_string(),
            evidence_excerpt: payload.evidence.clone(),
            is_read: false,
            created_at: now_rfc3339(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigia_core::types::AlertPayload;

    fn test_batch() -> MessageBatch {
        MessageBatch {
            id: "batch-1".to_string(),
            organization_id: "org-1".to_string(),
            group_id: "grp-1".to_string(),
            status: vigia_core::BatchStatus::Processing,
            start_ts: "2026-01-01T00:00:00.000Z".to_string(),
            end_ts: "2026-01-01T01:00:00.000Z".to_string(),
            message_count: 3,
            locked_at: Some("2026-01-01T02:00:00.000Z".to_string()),
            processed_at: None,
            error: None,
            created_at: "2026-01-01T02:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn build_alerts_applies_defaults() {
        let output = AnalysisOutput {
            alerts: Some(vec![AlertPayload {
                title: None,
                description: None,
                severity: None,
                evidence: None,
            }]),
            ..Default::default()
        };
        let alerts = build_alerts(&test_batch(), &output);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Intelligence alert");
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert_eq!(alerts[0].status, "open");
        assert!(!alerts[0].is_read);
        assert_eq!(alerts[0].batch_id, "batch-1");
    }

    #[test]
    fn build_alerts_empty_when_absent() {
        let output = AnalysisOutput::default();
        assert!(build_alerts(&test_batch(), &output).is_empty());
    }

    #[test]
    fn build_alerts_parses_severity_case_insensitively() {
        let output = AnalysisOutput {
            alerts: Some(vec![
                AlertPayload {
                    severity: Some("HIGH".to_string()),
                    ..Default::default()
                },
                AlertPayload {
                    severity: Some("nonsense".to_string()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        let alerts = build_alerts(&test_batch(), &output);
        assert_eq!(alerts[0].severity, Severity::High);
        assert_eq!(alerts[1].severity, Severity::Medium);
    }
}
