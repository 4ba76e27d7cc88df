// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Bayline shop store.
//!
//! This crate provides the record types, change events, error type, and the
//! adapter traits (persistent namespace, broadcast channel) that the storage
//! and bus crates implement and the store consumes.

pub mod error;
pub mod event;
pub mod records;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BaylineError;
pub use event::{Envelope, StoreEvent, StoreStats};
pub use records::{
    Appointment, AppointmentDraft, AppointmentStatus, Notification, NotificationDraft, Record,
    Role,
};
pub use types::{AdapterType, ContextId, HealthStatus};

pub use traits::{BroadcastChannel, PersistentNamespace, PluginAdapter};
