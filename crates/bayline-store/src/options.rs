// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use bayline_config::model::BaylineConfig;

/// Tunables a [`Store`](crate::Store) is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Namespace key holding the appointment array.
    pub appointments_key: String,
    /// Namespace key holding the notification array.
    pub notifications_key: String,
    /// Buffer of the local event stream returned by `subscribe()`.
    pub event_capacity: usize,
    /// Keep at most this many notifications, dropping the oldest.
    pub max_notifications: Option<usize>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            appointments_key: "appointments".to_string(),
            notifications_key: "notifications".to_string(),
            event_capacity: 256,
            max_notifications: None,
        }
    }
}

impl From<&BaylineConfig> for StoreOptions {
    fn from(config: &BaylineConfig) -> Self {
        Self {
            appointments_key: config.store.appointments_key.clone(),
            notifications_key: config.store.notifications_key.clone(),
            event_capacity: config.store.event_capacity,
            max_notifications: config.notifications.max_retained,
        }
    }
}
