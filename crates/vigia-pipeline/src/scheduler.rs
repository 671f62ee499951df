// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled summary sweep.
//!
//! Ticks on a configurable interval and finds organizations due for a
//! summary run: schedule hour matches the current UTC hour, the delivery
//! days include the current weekday, and no run has happened today. Each
//! due organization gets one batch per active group (when enough unbatched
//! messages exist), processed immediately. Per-organization failures are
//! logged and do not stop the sweep.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Timelike, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vigia_config::model::SchedulerConfig;
use vigia_core::types::Organization;
use vigia_core::{StorageAdapter, VigiaError};

use crate::processor::{BatchProcessor, ProcessOutcome};

/// Result of one scheduler sweep, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub organizations_due: usize,
    pub batches_processed: usize,
    pub groups_skipped: usize,
}

/// Periodic trigger that feeds due organizations into the batch processor.
pub struct SummaryScheduler {
    storage: Arc<dyn StorageAdapter>,
    processor: Arc<BatchProcessor>,
    config: SchedulerConfig,
}

impl SummaryScheduler {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        processor: Arc<BatchProcessor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            storage,
            processor,
            config,
        }
    }

    /// Whether an organization is due for a summary run at `now` (UTC).
    pub fn is_due(org: &Organization, now: DateTime<Utc>) -> bool {
        let Some(schedule_time) = org.summary_schedule_time.as_deref() else {
            return false;
        };

        // schedule_time is "HH:MM"; the sweep runs at hour granularity.
        let hour_prefix = format!("{:02}", now.hour());
        if !schedule_time.starts_with(&hour_prefix) {
            return false;
        }

        if !org
            .delivery_days()
            .iter()
            .any(|d| d == weekday_abbr(now.weekday()))
        {
            return false;
        }

        let today = now.format("%Y-%m-%d").to_string();
        org.last_summary_date.as_deref() != Some(today.as_str())
    }

    /// One sweep over all active organizations.
    pub async fn sweep_due(&self, now: DateTime<Utc>) -> Result<SweepReport, VigiaError> {
        let mut report = SweepReport::default();
        let today = now.format("%Y-%m-%d").to_string();
        let cutoff = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        for org in self.storage.active_organizations().await? {
            if !Self::is_due(&org, now) {
                continue;
            }
            report.organizations_due += 1;

            // Stamp before processing so a slow run cannot double-trigger
            // within the same hour.
            self.storage.set_last_summary_date(&org.id, &today).await?;

            if let Err(e) = self.run_organization(&org, &cutoff, &mut report).await {
                error!(organization_id = %org.id, error = %e, "scheduled run failed");
            }
        }

        if report.organizations_due > 0 {
            info!(
                due = report.organizations_due,
                processed = report.batches_processed,
                skipped = report.groups_skipped,
                "scheduler sweep complete"
            );
        }
        Ok(report)
    }

    async fn run_organization(
        &self,
        org: &Organization,
        cutoff: &str,
        report: &mut SweepReport,
    ) -> Result<(), VigiaError> {
        for group in self.storage.active_groups(&org.id).await? {
            let count = self
                .storage
                .count_unbatched_messages(&group.id, cutoff)
                .await?;
            if count < self.config.min_messages {
                debug!(
                    group_id = %group.id,
                    count,
                    min = self.config.min_messages,
                    "not enough unbatched messages, skipping group"
                );
                report.groups_skipped += 1;
                continue;
            }

            let Some(batch) = self
                .storage
                .create_batch_from_unbatched(&org.id, &group.id, cutoff)
                .await?
            else {
                continue;
            };

            match self.processor.process(&batch.id).await {
                Ok(ProcessOutcome::Completed { .. }) => report.batches_processed += 1,
                Ok(outcome) => {
                    warn!(batch_id = %batch.id, ?outcome, "scheduled batch not completed")
                }
                Err(e) => {
                    // The batch keeps its own error state; the sweep moves on.
                    error!(batch_id = %batch.id, error = %e, "scheduled batch failed");
                }
            }
        }
        Ok(())
    }

    /// Run the sweep loop until cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(self.config.interval_secs));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_due(Utc::now()).await {
                        error!(error = %e, "scheduler sweep failed");
                    }
                }
            }
        }
    }
}

fn weekday_abbr(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "mon",
        chrono::Weekday::Tue => "tue",
        chrono::Weekday::Wed => "wed",
        chrono::Weekday::Thu => "thu",
        chrono::Weekday::Fri => "fri",
        chrono::Weekday::Sat => "sat",
        chrono::Weekday::Sun => "sun",
    }
}
