// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delegating storage wrapper that fails selected operations.
//!
//! Used to exercise the fan-out's partial-failure isolation: every call
//! passes through to the inner adapter except the operations explicitly
//! configured to fail.

use std::sync::Arc;

use async_trait::async_trait;

use vigia_core::types::{
    AdminContact, Alert, DeliveryItem, DeliveryKind, Group, GroupAnalytics, GroupContext,
    Message, MessageBatch, Organization, Summary,
};
use vigia_core::{StorageAdapter, VigiaError};

/// Storage wrapper with per-operation failure injection.
pub struct FailingStorage {
    inner: Arc<dyn StorageAdapter>,
    fail_insert_alerts: bool,
    fail_insert_summary: bool,
    fail_upsert_analytics: bool,
    fail_enqueue: bool,
}

impl FailingStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>) -> Self {
        Self {
            inner,
            fail_insert_alerts: false,
            fail_insert_summary: false,
            fail_upsert_analytics: false,
            fail_enqueue: false,
        }
    }

    pub fn failing_insert_alerts(mut self) -> Self {
        self.fail_insert_alerts = true;
        self
    }

    pub fn failing_insert_summary(mut self) -> Self {
        self.fail_insert_summary = true;
        self
    }

    pub fn failing_upsert_analytics(mut self) -> Self {
        self.fail_upsert_analytics = true;
        self
    }

    pub fn failing_enqueue(mut self) -> Self {
        self.fail_enqueue = true;
        self
    }

    fn injected(op: &str) -> VigiaError {
        VigiaError::Storage {
            source: format!("injected failure: {op}").into(),
        }
    }
}

#[async_trait]
impl StorageAdapter for FailingStorage {
    async fn close(&self) -> Result<(), VigiaError> {
        self.inner.close().await
    }

    async fn insert_message(&self, message: &Message) -> Result<(), VigiaError> {
        self.inner.insert_message(message).await
    }

    async fn messages_for_batch(&self, batch_id: &str) -> Result<Vec<Message>, VigiaError> {
        self.inner.messages_for_batch(batch_id).await
    }

    async fn count_unbatched_messages(
        &self,
        group_id: &str,
        cutoff: &str,
    ) -> Result<i64, VigiaError> {
        self.inner.count_unbatched_messages(group_id, cutoff).await
    }

    async fn create_batch_from_unbatched(
        &self,
        organization_id: &str,
        group_id: &str,
        cutoff: &str,
    ) -> Result<Option<MessageBatch>, VigiaError> {
        self.inner
            .create_batch_from_unbatched(organization_id, group_id, cutoff)
            .await
    }

    async fn next_pending_batch(&self) -> Result<Option<MessageBatch>, VigiaError> {
        self.inner.next_pending_batch().await
    }

    async fn get_batch(&self, id: &str) -> Result<Option<MessageBatch>, VigiaError> {
        self.inner.get_batch(id).await
    }

    async fn claim_batch(&self, id: &str) -> Result<bool, VigiaError> {
        self.inner.claim_batch(id).await
    }

    async fn finalize_done(&self, id: &str) -> Result<(), VigiaError> {
        self.inner.finalize_done(id).await
    }

    async fn finalize_error(&self, id: &str, error: &str) -> Result<(), VigiaError> {
        self.inner.finalize_error(id, error).await
    }

    async fn release_stale_batches(&self, cutoff: &str) -> Result<usize, VigiaError> {
        self.inner.release_stale_batches(cutoff).await
    }

    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<(), VigiaError> {
        if self.fail_insert_alerts {
            return Err(Self::injected("insert_alerts"));
        }
        self.inner.insert_alerts(alerts).await
    }

    async fn insert_summary(&self, summary: &Summary) -> Result<(), VigiaError> {
        if self.fail_insert_summary {
            return Err(Self::injected("insert_summary"));
        }
        self.inner.insert_summary(summary).await
    }

    async fn upsert_group_analytics(
        &self,
        analytics: &GroupAnalytics,
    ) -> Result<(), VigiaError> {
        if self.fail_upsert_analytics {
            return Err(Self::injected("upsert_group_analytics"));
        }
        self.inner.upsert_group_analytics(analytics).await
    }

    async fn enqueue(&self, kind: DeliveryKind, payload: &str) -> Result<i64, VigiaError> {
        if self.fail_enqueue {
            return Err(Self::injected("enqueue"));
        }
        self.inner.enqueue(kind, payload).await
    }

    async fn dequeue(&self, kind: DeliveryKind) -> Result<Option<DeliveryItem>, VigiaError> {
        self.inner.dequeue(kind).await
    }

    async fn ack(&self, id: i64) -> Result<(), VigiaError> {
        self.inner.ack(id).await
    }

    async fn fail(&self, id: i64) -> Result<(), VigiaError> {
        self.inner.fail(id).await
    }

    async fn group_context(&self, group_id: &str) -> Result<Option<GroupContext>, VigiaError> {
        self.inner.group_context(group_id).await
    }

    async fn organization_admins(
        &self,
        organization_id: &str,
    ) -> Result<Vec<AdminContact>, VigiaError> {
        self.inner.organization_admins(organization_id).await
    }

    async fn active_organizations(&self) -> Result<Vec<Organization>, VigiaError> {
        self.inner.active_organizations().await
    }

    async fn active_groups(&self, organization_id: &str) -> Result<Vec<Group>, VigiaError> {
        self.inner.active_groups(organization_id).await
    }

    async fn set_last_summary_date(
        &self,
        organization_id: &str,
        date: &str,
    ) -> Result<(), VigiaError> {
        self.inner.set_last_summary_date(organization_id, date).await
    }
}
