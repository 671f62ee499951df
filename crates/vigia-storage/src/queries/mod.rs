// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for typed operations on storage entities.

pub mod alerts;
pub mod analytics;
pub mod batches;
pub mod messages;
pub mod orgs;
pub mod queue;
pub mod summaries;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for query module tests.

    use rusqlite::params;
    use tempfile::tempdir;

    use crate::database::Database;
    use vigia_core::types::Message;

    pub const ORG_ID: &str = "org-1";
    pub const GROUP_ID: &str = "grp-1";

    /// Opens a fresh database in a tempdir with one organization and one
    /// active group seeded.
    pub async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        db.connection()
            .call(|conn| -> tokio_rusqlite::Result<()> {
                conn.execute(
                    "INSERT INTO organizations (id, name, plan, is_active)
                     VALUES (?1, 'Acme', 'pro', 1)",
                    params![ORG_ID],
                )?;
                conn.execute(
                    "INSERT INTO groups (id, organization_id, name, is_active)
                     VALUES (?1, ?2, 'Sales Team', 1)",
                    params![GROUP_ID, ORG_ID],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        (db, dir)
    }

    /// Builds a message for the seeded group with the given id and timestamp.
    pub fn make_message(id: &str, message_ts: &str) -> Message {
        Message {
            id: id.to_string(),
            group_id: GROUP_ID.to_string(),
            organization_id: ORG_ID.to_string(),
            author_hash: format!("author-{id}"),
            content_text: format!("message body {id}"),
            message_ts: message_ts.to_string(),
            batch_id: None,
            created_at: message_ts.to_string(),
        }
    }
}
