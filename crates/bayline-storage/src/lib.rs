// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Bayline shop store.
//!
//! Provides WAL-mode SQLite storage with embedded migrations and a
//! single-writer concurrency model via `tokio-rusqlite`. Two adapters sit on
//! top of the same [`Database`]:
//!
//! - [`SqliteNamespace`], the persistent key-value namespace
//! - [`SqliteChannel`], a broadcast channel polled from a message table, so
//!   separate processes opening the same file see each other's changes

pub mod channel;
pub mod database;
pub mod migrations;
pub mod models;
pub mod namespace;
pub mod queries;

pub use channel::SqliteChannel;
pub use database::Database;
pub use models::BroadcastRow;
pub use namespace::SqliteNamespace;
