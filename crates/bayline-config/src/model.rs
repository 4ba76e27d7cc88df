// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Bayline store.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Bayline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BaylineConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Persistent namespace backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Store collection keys and event buffering.
    #[serde(default)]
    pub store: StoreConfig,

    /// Notification retention settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Cross-context broadcast settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// SQLite namespace configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Disable to run the store from its in-memory mirror only.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Namespace the collection keys are stored under. Contexts that share a
    /// namespace share data.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            database_path: default_database_path(),
            wal_mode: default_true(),
            namespace: default_namespace(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("bayline").join("bayline.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("bayline.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Key holding the appointment collection.
    #[serde(default = "default_appointments_key")]
    pub appointments_key: String,

    /// Key holding the notification collection.
    #[serde(default = "default_notifications_key")]
    pub notifications_key: String,

    /// Capacity of the local subscriber event buffer. Slow subscribers past
    /// this many events observe a lag.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            appointments_key: default_appointments_key(),
            notifications_key: default_notifications_key(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_appointments_key() -> String {
    "appointments".to_string()
}

fn default_notifications_key() -> String {
    "notifications".to_string()
}

fn default_event_capacity() -> usize {
    256
}

/// Notification retention configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Keep at most this many notifications; the oldest are dropped on insert.
    /// `None` keeps everything.
    #[serde(default)]
    pub max_retained: Option<usize>,
}

/// Broadcast channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Disable to stop posting and listening for changes from other contexts.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Name of the channel shared by all contexts.
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// How often the SQLite channel polls for new messages.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of most recent messages the SQLite channel keeps.
    #[serde(default = "default_retain_messages")]
    pub retain_messages: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            channel_name: default_channel_name(),
            poll_interval_ms: default_poll_interval_ms(),
            retain_messages: default_retain_messages(),
        }
    }
}

fn default_channel_name() -> String {
    "bayline-sync".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_retain_messages() -> u64 {
    1000
}
