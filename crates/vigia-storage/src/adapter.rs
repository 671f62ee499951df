// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tracing::debug;

use vigia_config::model::StorageConfig;
use vigia_core::types::{
    AdminContact, Alert, DeliveryItem, DeliveryKind, Group, GroupAnalytics, GroupContext,
    Message, MessageBatch, Organization, Summary,
};
use vigia_core::{StorageAdapter, VigiaError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. Opening runs migrations and PRAGMA setup.
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Open the database described by the configuration.
    pub async fn open(config: &StorageConfig) -> Result<Self, VigiaError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self { db })
    }

    /// Wrap an already-open database handle (tests and tools).
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn close(&self) -> Result<(), VigiaError> {
        self.db.close().await
    }

    // --- Message operations ---

    async fn insert_message(&self, message: &Message) -> Result<(), VigiaError> {
        queries::messages::insert_message(&self.db, message).await
    }

    async fn messages_for_batch(&self, batch_id: &str) -> Result<Vec<Message>, VigiaError> {
        queries::messages::messages_for_batch(&self.db, batch_id).await
    }

    async fn count_unbatched_messages(
        &self,
        group_id: &str,
        cutoff: &str,
    ) -> Result<i64, VigiaError> {
        queries::messages::count_unbatched(&self.db, group_id, cutoff).await
    }

    // --- Batch lifecycle ---

    async fn create_batch_from_unbatched(
        &self,
        organization_id: &str,
        group_id: &str,
        cutoff: &str,
    ) -> Result<Option<MessageBatch>, VigiaError> {
        queries::batches::create_batch_from_unbatched(&self.db, organization_id, group_id, cutoff)
            .await
    }

    async fn next_pending_batch(&self) -> Result<Option<MessageBatch>, VigiaError> {
        queries::batches::next_pending(&self.db).await
    }

    async fn get_batch(&self, id: &str) -> Result<Option<MessageBatch>, VigiaError> {
        queries::batches::get_batch(&self.db, id).await
    }

    async fn claim_batch(&self, id: &str) -> Result<bool, VigiaError> {
        queries::batches::claim(&self.db, id).await
    }

    async fn finalize_done(&self, id: &str) -> Result<(), VigiaError> {
        queries::batches::finalize_done(&self.db, id).await
    }

    async fn finalize_error(&self, id: &str, error: &str) -> Result<(), VigiaError> {
        queries::batches::finalize_error(&self.db, id, error).await
    }

    async fn release_stale_batches(&self, cutoff: &str) -> Result<usize, VigiaError> {
        queries::batches::release_stale(&self.db, cutoff).await
    }

    // --- Fan-out writes ---

    async fn insert_alerts(&self, alerts: &[Alert]) -> Result<(), VigiaError> {
        queries::alerts::insert_alerts(&self.db, alerts).await
    }

    async fn insert_summary(&self, summary: &Summary) -> Result<(), VigiaError> {
        queries::summaries::insert_summary(&self.db, summary).await
    }

    async fn upsert_group_analytics(
        &self,
        analytics: &GroupAnalytics,
    ) -> Result<(), VigiaError> {
        queries::analytics::upsert_group_analytics(&self.db, analytics).await
    }

    // --- Delivery queue ---

    async fn enqueue(&self, kind: DeliveryKind, payload: &str) -> Result<i64, VigiaError> {
        queries::queue::enqueue(&self.db, kind, payload).await
    }

    async fn dequeue(&self, kind: DeliveryKind) -> Result<Option<DeliveryItem>, VigiaError> {
        queries::queue::dequeue(&self.db, kind).await
    }

    async fn ack(&self, id: i64) -> Result<(), VigiaError> {
        queries::queue::ack(&self.db, id).await
    }

    async fn fail(&self, id: i64) -> Result<(), VigiaError> {
        queries::queue::fail(&self.db, id).await
    }

    // --- Context lookups ---

    async fn group_context(&self, group_id: &str) -> Result<Option<GroupContext>, VigiaError> {
        queries::orgs::group_context(&self.db, group_id).await
    }

    async fn organization_admins(
        &self,
        organization_id: &str,
    ) -> Result<Vec<AdminContact>, VigiaError> {
        queries::orgs::organization_admins(&self.db, organization_id).await
    }

    async fn active_organizations(&self) -> Result<Vec<Organization>, VigiaError> {
        queries::orgs::active_organizations(&self.db).await
    }

    async fn active_groups(&self, organization_id: &str) -> Result<Vec<Group>, VigiaError> {
        queries::orgs::active_groups(&self.db, organization_id).await
    }

    async fn set_last_summary_date(
        &self,
        organization_id: &str,
        date: &str,
    ) -> Result<(), VigiaError> {
        queries::orgs::set_last_summary_date(&self.db, organization_id, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vigia_core::types::now_rfc3339;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    async fn seeded_storage(path: &str) -> SqliteStorage {
        let storage = SqliteStorage::open(&make_config(path)).await.unwrap();
        storage
            .database()
            .connection()
            .call(|conn| -> tokio_rusqlite::Result<()> {
                conn.execute_batch(
                    "INSERT INTO organizations (id, name, plan, is_active)
                     VALUES ('org-1', 'Acme', 'pro', 1);
                     INSERT INTO groups (id, organization_id, name, is_active)
                     VALUES ('grp-1', 'org-1', 'Sales Team', 1);",
                )?;
                Ok(())
            })
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn open_creates_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("adapter.db");
        let _storage = SqliteStorage::open(&make_config(db_path.to_str().unwrap()))
            .await
            .unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn full_batch_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let storage = seeded_storage(db_path.to_str().unwrap()).await;

        let message = Message {
            id: "m1".to_string(),
            group_id: "grp-1".to_string(),
            organization_id: "org-1".to_string(),
            author_hash: "author-1".to_string(),
            content_text: "hello".to_string(),
            message_ts: "2026-01-01T10:00:00.000Z".to_string(),
            batch_id: None,
            created_at: now_rfc3339(),
        };
        storage.insert_message(&message).await.unwrap();

        let batch = storage
            .create_batch_from_unbatched("org-1", "grp-1", "2026-01-02T00:00:00.000Z")
            .await
            .unwrap()
            .expect("batch should be created");
        assert_eq!(batch.message_count, 1);

        let next = storage.next_pending_batch().await.unwrap().unwrap();
        assert_eq!(next.id, batch.id);

        assert!(storage.claim_batch(&batch.id).await.unwrap());
        storage.finalize_done(&batch.id).await.unwrap();

        let done = storage.get_batch(&batch.id).await.unwrap().unwrap();
        assert_eq!(done.status, vigia_core::BatchStatus::Done);

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn queue_operations_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("queue_adapter.db");
        let storage = seeded_storage(db_path.to_str().unwrap()).await;

        let id = storage
            .enqueue(DeliveryKind::Email, r#"{"to":"a@b.test"}"#)
            .await
            .unwrap();
        assert!(id > 0);

        let item = storage.dequeue(DeliveryKind::Email).await.unwrap();
        assert!(item.is_some());
        let item = item.unwrap();
        assert_eq!(item.status, "processing");

        storage.ack(item.id).await.unwrap();

        storage.close().await.unwrap();
    }
}
