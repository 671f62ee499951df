// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary persistence.

use rusqlite::params;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::Summary;

/// Insert one summary row.
pub async fn insert_summary(db: &Database, summary: &Summary) -> Result<(), VigiaError> {
    let summary = summary.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO summaries
                 (id, organization_id, group_id, batch_id, summary_text,
                  period_start, period_end, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    summary.id,
                    summary.organization_id,
                    summary.group_id,
                    summary.batch_id,
                    summary.summary_text,
                    summary.period_start,
                    summary.period_end,
                    summary.is_read,
                    summary.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count summaries attached to one batch.
pub async fn count_for_batch(db: &Database, batch_id: &str) -> Result<i64, VigiaError> {
    let batch_id = batch_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM summaries WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::batches::create_batch_from_unbatched;
    use crate::queries::messages::insert_message;
    use crate::queries::testing::{make_message, setup_db, GROUP_ID, ORG_ID};
    use vigia_core::types::now_rfc3339;

    #[tokio::test]
    async fn insert_and_count_summary() {
        let (db, _dir) = setup_db().await;
        insert_message(&db, &make_message("m1", "2026-01-01T10:00:00.000Z"))
            .await
            .unwrap();
        let batch = create_batch_from_unbatched(&db, ORG_ID, GROUP_ID, "2026-01-02T00:00:00.000Z")
            .await
            .unwrap()
            .unwrap();

        let summary = Summary {
            id: "sum-1".to_string(),
            organization_id: ORG_ID.to_string(),
            group_id: GROUP_ID.to_string(),
            batch_id: batch.id.clone(),
            summary_text: "The group discussed quarterly targets.".to_string(),
            period_start: batch.start_ts.clone(),
            period_end: batch.end_ts.clone(),
            is_read: false,
            created_at: now_rfc3339(),
        };
        insert_summary(&db, &summary).await.unwrap();

        assert_eq!(count_for_batch(&db, &batch.id).await.unwrap(), 1);
        db.close().await.unwrap();
    }
}
