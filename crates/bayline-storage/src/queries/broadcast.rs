// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast message log operations.

use bayline_core::BaylineError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::BroadcastRow;

/// Append a message to `channel`. Returns the message id.
pub async fn append(db: &Database, channel: &str, payload: &str) -> Result<i64, BaylineError> {
    let channel = channel.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO broadcast_messages (channel, payload) VALUES (?1, ?2)",
                params![channel, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Highest message id on `channel`, or 0 when the channel is empty.
pub async fn latest_id(db: &Database, channel: &str) -> Result<i64, BaylineError> {
    let channel = channel.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COALESCE(MAX(id), 0) FROM broadcast_messages WHERE channel = ?1",
                params![channel],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Messages on `channel` with id greater than `after`, oldest first.
pub async fn since(
    db: &Database,
    channel: &str,
    after: i64,
    limit: i64,
) -> Result<Vec<BroadcastRow>, BaylineError> {
    let channel = channel.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<BroadcastRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, channel, payload, created_at FROM broadcast_messages
                 WHERE channel = ?1 AND id > ?2
                 ORDER BY id ASC
                 LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(params![channel, after, limit], |row| {
                    Ok(BroadcastRow {
                        id: row.get(0)?,
                        channel: row.get(1)?,
                        payload: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Keep only the `keep` most recent messages of `channel`. Returns how many were deleted.
pub async fn prune(db: &Database, channel: &str, keep: u64) -> Result<usize, BaylineError> {
    let channel = channel.to_string();
    let keep = i64::try_from(keep).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM broadcast_messages
                 WHERE channel = ?1 AND id NOT IN (
                     SELECT id FROM broadcast_messages
                     WHERE channel = ?1
                     ORDER BY id DESC
                     LIMIT ?2
                 )",
                params![channel, keep],
            )
        })
        .await
        .map_err(map_tr_err)
}
