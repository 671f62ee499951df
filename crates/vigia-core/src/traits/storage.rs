// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::VigiaError;
use crate::types::{
    AdminContact, Alert, DeliveryItem, DeliveryKind, Group, GroupAnalytics, GroupContext,
    Message, MessageBatch, Organization, Summary,
};

/// Adapter for the relational store backing the pipeline.
///
/// Timestamps are stamped inside the storage layer (SQLite `strftime`) so
/// that lock and finalize times come from a single clock. Callers pass
/// explicit cutoffs where selection windows are involved.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), VigiaError>;

    // --- Message operations ---

    /// Appends one inbound message to the store.
    async fn insert_message(&self, message: &Message) -> Result<(), VigiaError>;

    /// Returns a batch's tagged messages in timestamp-ascending order.
    async fn messages_for_batch(&self, batch_id: &str) -> Result<Vec<Message>, VigiaError>;

    /// Counts a group's unbatched messages up to `cutoff` (inclusive).
    async fn count_unbatched_messages(
        &self,
        group_id: &str,
        cutoff: &str,
    ) -> Result<i64, VigiaError>;

    // --- Batch lifecycle ---

    /// Creates a batch from the group's unbatched messages up to `cutoff`.
    ///
    /// Selection and tagging happen in one transaction over the same message
    /// set, so `start_ts`/`end_ts`/`message_count` describe exactly the
    /// messages that received the new batch id. Returns `None` when the
    /// group has no unbatched messages in the window.
    async fn create_batch_from_unbatched(
        &self,
        organization_id: &str,
        group_id: &str,
        cutoff: &str,
    ) -> Result<Option<MessageBatch>, VigiaError>;

    /// Returns the oldest pending batch, if any (FIFO across organizations).
    async fn next_pending_batch(&self) -> Result<Option<MessageBatch>, VigiaError>;

    /// Fetches one batch by id.
    async fn get_batch(&self, id: &str) -> Result<Option<MessageBatch>, VigiaError>;

    /// Atomically claims a pending batch for processing.
    ///
    /// Single conditional update: the batch moves to `processing` (with
    /// `locked_at` stamped) only if it is still `pending`. Returns `false`
    /// when another invocation won the race.
    async fn claim_batch(&self, id: &str) -> Result<bool, VigiaError>;

    /// Marks a processing batch `done`, stamping `processed_at` and clearing
    /// any previous error.
    async fn finalize_done(&self, id: &str) -> Result<(), VigiaError>;

    /// Marks a processing batch `error`, recording the failure message.
    async fn finalize_error(&self, id: &str, error: &str) -> Result<(), VigiaError>;

    /// Returns stale `processing` batches (locked before `cutoff`) to
    /// `pending`. Returns the number of batches reclaimed.
    async fn release_stale_batches(&self, cutoff: &str) -> Result<usize, VigiaError>;

    // --- Fan-out writes ---

    /// Bulk-inserts alert rows.
    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<(), VigiaError>;

    /// Inserts one summary row.
    async fn insert_summary(&self, summary: &Summary) -> Result<(), VigiaError>;

    /// Upserts the analytics snapshot keyed by
    /// `(group_id, period_start, period_end)`.
    async fn upsert_group_analytics(&self, analytics: &GroupAnalytics)
        -> Result<(), VigiaError>;

    // --- Delivery queue (outbox) ---

    /// Enqueues an outbound payload with status `pending`. Returns the
    /// queue entry id.
    async fn enqueue(&self, kind: DeliveryKind, payload: &str) -> Result<i64, VigiaError>;

    /// Atomically claims the oldest pending entry of the given kind for the
    /// drain worker. Returns `None` when the queue is empty.
    async fn dequeue(&self, kind: DeliveryKind) -> Result<Option<DeliveryItem>, VigiaError>;

    /// Acknowledges successful delivery of a queue entry.
    async fn ack(&self, id: i64) -> Result<(), VigiaError>;

    /// Records a failed delivery attempt, retrying until `max_attempts`.
    async fn fail(&self, id: i64) -> Result<(), VigiaError>;

    // --- Context lookups ---

    /// Fetches a group joined with its owning organization.
    async fn group_context(&self, group_id: &str) -> Result<Option<GroupContext>, VigiaError>;

    /// Returns the notification contacts of an organization's admins.
    async fn organization_admins(
        &self,
        organization_id: &str,
    ) -> Result<Vec<AdminContact>, VigiaError>;

    /// Returns all active organizations (scheduler input).
    async fn active_organizations(&self) -> Result<Vec<Organization>, VigiaError>;

    /// Returns an organization's active groups.
    async fn active_groups(&self, organization_id: &str) -> Result<Vec<Group>, VigiaError>;

    /// Stamps the date of the last scheduler-triggered summary run.
    async fn set_last_summary_date(
        &self,
        organization_id: &str,
        date: &str,
    ) -> Result<(), VigiaError>;
}
