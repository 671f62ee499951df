// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store operations.
//!
//! Messages are append-only; the only mutation is the one-time `batch_id`
//! tag applied by [`crate::queries::batches::create_batch_from_unbatched`].

use rusqlite::params;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::Message;

pub(crate) fn message_from_row(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    Ok(Message {
        id: row.get(0)?,
        group_id: row.get(1)?,
        organization_id: row.get(2)?,
        author_hash: row.get(3)?,
        content_text: row.get(4)?,
        message_ts: row.get(5)?,
        batch_id: row.get(6)?,
        created_at: row.get(7)?,
    })
}

const MESSAGE_COLUMNS: &str =
    "id, group_id, organization_id, author_hash, content_text, message_ts, batch_id, created_at";

/// Append one inbound message.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), VigiaError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages
                 (id, group_id, organization_id, author_hash, content_text, message_ts, batch_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    msg.id,
                    msg.group_id,
                    msg.organization_id,
                    msg.author_hash,
                    msg.content_text,
                    msg.message_ts,
                    msg.batch_id,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a batch's tagged messages in timestamp-ascending order.
pub async fn messages_for_batch(
    db: &Database,
    batch_id: &str,
) -> Result<Vec<Message>, VigiaError> {
    let batch_id = batch_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE batch_id = ?1
                 ORDER BY message_ts ASC"
            ))?;
            let rows = stmt.query_map(params![batch_id], message_from_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count a group's unbatched messages up to `cutoff` (inclusive).
pub async fn count_unbatched(
    db: &Database,
    group_id: &str,
    cutoff: &str,
) -> Result<i64, VigiaError> {
    let group_id = group_id.to_string();
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE group_id = ?1 AND batch_id IS NULL AND message_ts <= ?2",
                params![group_id, cutoff],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
