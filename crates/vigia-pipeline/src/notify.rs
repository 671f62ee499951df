// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification dispatch.
//!
//! Best-effort side channel, fully decoupled from batch success: every
//! failure here is caught and logged, and never changes the batch's final
//! status. The dispatcher only writes to the delivery queue; actual sending
//! is the drain worker's job.

use std::sync::Arc;

use tracing::{debug, warn};

use vigia_core::types::{AdminContact, Alert, MessageBatch};
use vigia_core::{DeliveryKind, StorageAdapter, VigiaError};

use crate::outbox;

/// Queues urgent alert and summary notifications for organization admins.
pub struct NotificationDispatcher {
    storage: Arc<dyn StorageAdapter>,
}

impl NotificationDispatcher {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Queue one urgent notification per admin with a resolvable email,
    /// referencing the given alert.
    ///
    /// The caller passes the *first* high-severity alert of the batch; the
    /// one-notification-per-admin throttle is a deliberate design choice to
    /// avoid flooding an admin with one email per alert.
    ///
    /// Returns the number of notifications queued. Never fails: enqueue
    /// errors are logged and swallowed.
    pub async fn dispatch_urgent(
        &self,
        batch: &MessageBatch,
        group_name: &str,
        admins: &[AdminContact],
        alert: &Alert,
    ) -> usize {
        let mut queued = 0;
        for admin in admins {
            let Some(email) = admin.email.as_deref() else {
                debug!(user_id = %admin.user_id, "skipping admin without email");
                continue;
            };
            let payload =
                outbox::alert_email(email, &admin.user_id, group_name, &alert.title, &alert.summary);
            match self.enqueue_json(DeliveryKind::Email, &payload).await {
                Ok(_) => queued += 1,
                Err(e) => {
                    warn!(batch_id = %batch.id, user_id = %admin.user_id, error = %e,
                          "failed to queue urgent notification");
                }
            }
        }
        queued
    }

    /// Queue summary delivery for admins that opted in, per channel.
    ///
    /// Returns the number of notifications queued. Never fails.
    pub async fn dispatch_summary(
        &self,
        batch: &MessageBatch,
        group_name: &str,
        admins: &[AdminContact],
        summary_text: &str,
    ) -> usize {
        let mut queued = 0;
        for admin in admins {
            if admin.email_summary_enabled
                && let Some(email) = admin.email.as_deref()
            {
                let payload =
                    outbox::summary_email(email, &admin.user_id, group_name, summary_text);
                match self.enqueue_json(DeliveryKind::Email, &payload).await {
                    Ok(_) => queued += 1,
                    Err(e) => {
                        warn!(batch_id = %batch.id, user_id = %admin.user_id, error = %e,
                              "failed to queue summary email");
                    }
                }
            }

            if admin.whatsapp_summary_enabled
                && let Some(phone) = admin.whatsapp.as_deref()
            {
                let payload = outbox::summary_template(phone, group_name, summary_text);
                match self.enqueue_json(DeliveryKind::Whatsapp, &payload).await {
                    Ok(_) => queued += 1,
                    Err(e) => {
                        warn!(batch_id = %batch.id, user_id = %admin.user_id, error = %e,
                              "failed to queue summary template");
                    }
                }
            }
        }
        queued
    }

    async fn enqueue_json<T: serde::Serialize>(
        &self,
        kind: DeliveryKind,
        payload: &T,
    ) -> Result<i64, VigiaError> {
        let json = serde_json::to_string(payload).map_err(|e| VigiaError::Delivery {
            message: format!("failed to encode {kind} payload: {e}"),
            source: Some(Box::new(e)),
        })?;
        self.storage.enqueue(kind, &json).await
    }
}
