// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the storage tables.

/// One message in the `broadcast_messages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRow {
    pub id: i64,
    pub channel: String,
    pub payload: String,
    pub created_at: String,
}
