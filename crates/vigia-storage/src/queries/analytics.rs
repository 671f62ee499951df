// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group analytics snapshots.
//!
//! Keyed by `(group_id, period_start, period_end)`: re-processing the same
//! period updates the existing row instead of duplicating it, which keeps
//! the fan-out step safe to repeat.

use rusqlite::params;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::GroupAnalytics;

/// Upsert the analytics snapshot for one period.
pub async fn upsert_group_analytics(
    db: &Database,
    analytics: &GroupAnalytics,
) -> Result<(), VigiaError> {
    let analytics = analytics.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO group_analytics
                 (id, organization_id, group_id, period_start, period_end,
                  sentiment_score, message_count, alert_count_total, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (group_id, period_start, period_end) DO UPDATE SET
                     sentiment_score = excluded.sentiment_score,
                     message_count = excluded.message_count,
                     alert_count_total = excluded.alert_count_total",
                params![
                    analytics.id,
                    analytics.organization_id,
                    analytics.group_id,
                    analytics.period_start,
                    analytics.period_end,
                    analytics.sentiment_score,
                    analytics.message_count,
                    analytics.alert_count_total,
                    analytics.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the snapshot for one period, if present.
pub async fn get_for_period(
    db: &Database,
    group_id: &str,
    period_start: &str,
    period_end: &str,
) -> Result<Option<GroupAnalytics>, VigiaError> {
    let group_id = group_id.to_string();
    let period_start = period_start.to_string();
    let period_end = period_end.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, organization_id, group_id, period_start, period_end,
                        sentiment_score, message_count, alert_count_total, created_at
                 FROM group_analytics
                 WHERE group_id = ?1 AND period_start = ?2 AND period_end = ?3",
                params![group_id, period_start, period_end],
                |row| {
                    Ok(GroupAnalytics {
                        id: row.get(0)?,
                        organization_id: row.get(1)?,
                        group_id: row.get(2)?,
                        period_start: row.get(3)?,
                        period_end: row.get(4)?,
                        sentiment_score: row.get(5)?,
                        message_count: row.get(6)?,
                        alert_count_total: row.get(7)?,
                        created_at: row.get(8)?,
                    })
                },
            );
            match result {
                Ok(analytics) => Ok(Some(analytics)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
