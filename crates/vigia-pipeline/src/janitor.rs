// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stale-batch janitor.
//!
//! A batch claimed by an invocation that crashed before `Finalize` stays in
//! `processing` forever. The janitor periodically returns such batches to
//! `pending` once their lock is older than the configured threshold, making
//! them eligible for re-claim.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use vigia_core::{StorageAdapter, VigiaError};

/// Periodically reclaims stale `processing` batches.
pub struct JanitorRunner {
    storage: Arc<dyn StorageAdapter>,
    interval: Duration,
    stale_after: Duration,
}

impl JanitorRunner {
    pub fn new(storage: Arc<dyn StorageAdapter>, interval: Duration, stale_after: Duration) -> Self {
        Self {
            storage,
            interval,
            stale_after,
        }
    }

    /// One sweep: reclaim batches locked before `now - stale_after`.
    /// Returns the reclaim count.
    pub async fn sweep(&self) -> Result<usize, VigiaError> {
        let cutoff = (chrono::Utc::now()
            - chrono::Duration::from_std(self.stale_after).unwrap_or_default())
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let reclaimed = self.storage.release_stale_batches(&cutoff).await?;
        if reclaimed > 0 {
            info!(reclaimed, cutoff = %cutoff, "reclaimed stale processing batches");
        } else {
            debug!(cutoff = %cutoff, "no stale batches");
        }
        Ok(reclaimed)
    }

    /// Run the sweep loop until cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; that is fine for a sweep.
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("janitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "janitor sweep failed");
                    }
                }
            }
        }
    }
}
