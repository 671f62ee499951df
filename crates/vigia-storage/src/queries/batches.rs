// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch lifecycle operations.
//!
//! The state machine is `pending -> processing -> {done | error}`. Every
//! transition is a conditional update guarded on the current status, so the
//! terminal states are sticky and two concurrent invocations can never both
//! claim the same batch.

use std::str::FromStr;

use rusqlite::params;
use uuid::Uuid;
use vigia_core::types::BatchStatus;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::MessageBatch;

const BATCH_COLUMNS: &str = "id, organization_id, group_id, status, start_ts, end_ts, \
                             message_count, locked_at, processed_at, error, created_at";

pub(crate) fn batch_from_row(row: &rusqlite::Row<'_>) -> Result<MessageBatch, rusqlite::Error> {
    let status_str: String = row.get(3)?;
    let status = BatchStatus::from_str(&status_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(MessageBatch {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        group_id: row.get(2)?,
        status,
        start_ts: row.get(4)?,
        end_ts: row.get(5)?,
        message_count: row.get(6)?,
        locked_at: row.get(7)?,
        processed_at: row.get(8)?,
        error: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Create a batch from a group's unbatched messages up to `cutoff`.
///
/// Runs in one transaction: the message set is selected in
/// timestamp-ascending order, the batch row is inserted spanning
/// `[min(ts), max(ts)]`, and exactly the selected ids are tagged. Messages
/// arriving after the selection stay unbatched for the next cycle.
/// Returns `None` when the window holds no unbatched messages.
pub async fn create_batch_from_unbatched(
    db: &Database,
    organization_id: &str,
    group_id: &str,
    cutoff: &str,
) -> Result<Option<MessageBatch>, VigiaError> {
    let organization_id = organization_id.to_string();
    let group_id = group_id.to_string();
    let cutoff = cutoff.to_string();
    let batch_id = Uuid::new_v4().to_string();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let selected: Vec<(String, String)> = {
                let mut stmt = tx.prepare(
                    "SELECT id, message_ts FROM messages
                     WHERE group_id = ?1 AND batch_id IS NULL AND message_ts <= ?2
                     ORDER BY message_ts ASC",
                )?;
                let rows = stmt.query_map(params![group_id, cutoff], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;
                let mut selected = Vec::new();
                for row in rows {
                    selected.push(row?);
                }
                selected
            };

            if selected.is_empty() {
                tx.commit()?;
                return Ok(None);
            }

            let start_ts = selected[0].1.clone();
            let end_ts = selected[selected.len() - 1].1.clone();
            let message_count = selected.len() as i64;

            tx.execute(
                "INSERT INTO message_batches
                 (id, organization_id, group_id, status, start_ts, end_ts, message_count)
                 VALUES (?1, ?2, ?3, 'pending', ?4, ?5, ?6)",
                params![
                    batch_id,
                    organization_id,
                    group_id,
                    start_ts,
                    end_ts,
                    message_count
                ],
            )?;

            // Tag exactly the measured set. The `batch_id IS NULL` guard
            // preserves at-most-one-batch-per-message even across bugs in
            // the selection above.
            {
                let mut tag = tx.prepare(
                    "UPDATE messages SET batch_id = ?1 WHERE id = ?2 AND batch_id IS NULL",
                )?;
                for (id, _) in &selected {
                    tag.execute(params![batch_id, id])?;
                }
            }

            let batch = tx.query_row(
                &format!("SELECT {BATCH_COLUMNS} FROM message_batches WHERE id = ?1"),
                params![batch_id],
                batch_from_row,
            )?;

            tx.commit()?;
            Ok(Some(batch))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return the oldest pending batch (FIFO across organizations), if any.
pub async fn next_pending(db: &Database) -> Result<Option<MessageBatch>, VigiaError> {
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {BATCH_COLUMNS} FROM message_batches
                     WHERE status = 'pending'
                     ORDER BY created_at ASC, id ASC
                     LIMIT 1"
                ),
                [],
                batch_from_row,
            );
            match result {
                Ok(batch) => Ok(Some(batch)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one batch by id.
pub async fn get_batch(db: &Database, id: &str) -> Result<Option<MessageBatch>, VigiaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {BATCH_COLUMNS} FROM message_batches WHERE id = ?1"),
                params![id],
                batch_from_row,
            );
            match result {
                Ok(batch) => Ok(Some(batch)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim a pending batch for processing.
///
/// Single conditional update: only a batch still in `pending` moves to
/// `processing`. Returns `false` when zero rows were affected, meaning
/// another invocation won the race (or the batch is already terminal).
pub async fn claim(db: &Database, id: &str) -> Result<bool, VigiaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE message_batches
                 SET status = 'processing',
                     locked_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a processing batch `done`, stamping `processed_at` and clearing any
/// recorded error.
pub async fn finalize_done(db: &Database, id: &str) -> Result<(), VigiaError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE message_batches
                 SET status = 'done',
                     processed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     error = NULL
                 WHERE id = ?1 AND status = 'processing'",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a processing batch `error`, recording the failure message.
pub async fn finalize_error(db: &Database, id: &str, error: &str) -> Result<(), VigiaError> {
    let id = id.to_string();
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE message_batches
                 SET status = 'error', error = ?2
                 WHERE id = ?1 AND status = 'processing'",
                params![id, error],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return stale `processing` batches to `pending`.
///
/// A batch whose `locked_at` is older than `cutoff` was claimed by an
/// invocation that died before finalizing. Returns the reclaim count.
pub async fn release_stale(db: &Database, cutoff: &str) -> Result<usize, VigiaError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE message_batches
                 SET status = 'pending', locked_at = NULL
                 WHERE status = 'processing' AND locked_at < ?1",
                params![cutoff],
            )?;
            Ok(changed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
