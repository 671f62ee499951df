// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery queue (outbox) operations.
//!
//! The pipeline only enqueues; an external drain worker claims entries with
//! `dequeue`, switches on `kind`, and reports the outcome with `ack`/`fail`.

use std::str::FromStr;

use rusqlite::params;
use vigia_core::types::DeliveryKind;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::DeliveryItem;

fn item_from_row(row: &rusqlite::Row<'_>) -> Result<DeliveryItem, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let kind = DeliveryKind::from_str(&kind_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(DeliveryItem {
        id: row.get(0)?,
        kind,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

/// Enqueue a new outbound payload. Returns the auto-generated entry ID.
pub async fn enqueue(
    db: &Database,
    kind: DeliveryKind,
    payload: &str,
) -> Result<i64, VigiaError> {
    let kind = kind.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO delivery_queue (kind, payload) VALUES (?1, ?2)",
                params![kind, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Dequeue the next pending entry of the given kind.
///
/// Atomically selects the oldest pending entry and marks it as "processing"
/// with a 5-minute lock timeout. Returns `None` if the queue is empty.
pub async fn dequeue(
    db: &Database,
    kind: DeliveryKind,
) -> Result<Option<DeliveryItem>, VigiaError> {
    let kind = kind.to_string();
    db.connection()
        .call(move |conn| {
            // Transaction to atomically find + claim the next pending entry.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(
                    "SELECT id, kind, payload, status, attempts, max_attempts,
                            created_at, updated_at, locked_until
                     FROM delivery_queue
                     WHERE kind = ?1 AND status = 'pending'
                     ORDER BY id ASC
                     LIMIT 1",
                )?;
                stmt.query_row(params![kind], item_from_row)
            };

            match result {
                Ok(item) => {
                    tx.execute(
                        "UPDATE delivery_queue SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![item.id],
                    )?;
                    tx.commit()?;

                    Ok(Some(DeliveryItem {
                        status: "processing".to_string(),
                        ..item
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge successful delivery of a queue entry.
///
/// Marks the entry as "sent".
pub async fn ack(db: &Database, id: i64) -> Result<(), VigiaError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE delivery_queue SET status = 'sent',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record a failed delivery attempt.
///
/// Increments attempts. If attempts >= max_attempts, sets status to "failed".
/// Otherwise resets to "pending" for retry and clears the lock.
pub async fn fail(db: &Database, id: i64) -> Result<(), VigiaError> {
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i32, i32) = conn.query_row(
                "SELECT attempts, max_attempts FROM delivery_queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            let status = if new_attempts >= max_attempts {
                "failed"
            } else {
                "pending"
            };
            conn.execute(
                "UPDATE delivery_queue SET status = ?1, attempts = ?2,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![status, new_attempts, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all entries of one kind in insertion order (inspection and tests).
pub async fn list_by_kind(
    db: &Database,
    kind: DeliveryKind,
) -> Result<Vec<DeliveryItem>, VigiaError> {
    let kind = kind.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, payload, status, attempts, max_attempts,
                        created_at, updated_at, locked_until
                 FROM delivery_queue
                 WHERE kind = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![kind], item_from_row)?;
            let mut items = Vec::new();
            for row in rows {
                items.push(row?);
            }
            Ok(items)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
