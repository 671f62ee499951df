// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert persistence.

use rusqlite::params;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::Alert;

/// Bulk-insert alert rows in one transaction.
pub async fn insert_alerts(db: &Database, alerts: &[Alert]) -> Result<(), VigiaError> {
    if alerts.is_empty() {
        return Ok(());
    }
    let alerts = alerts.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO alerts
                     (id, organization_id, group_id, batch_id, title, summary, severity,
                      status, evidence_excerpt, is_read, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                )?;
                for alert in &alerts {
                    stmt.execute(params![
                        alert.id,
                        alert.organization_id,
                        alert.group_id,
                        alert.batch_id,
                        alert.title,
                        alert.summary,
                        alert.severity.to_string(),
                        alert.status,
                        alert.evidence_excerpt,
                        alert.is_read,
                        alert.created_at,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count alerts attached to one batch.
pub async fn count_for_batch(db: &Database, batch_id: &str) -> Result<i64, VigiaError> {
    let batch_id = batch_id.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM alerts WHERE batch_id = ?1",
                params![batch_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
