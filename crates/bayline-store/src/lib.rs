// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appointment and notification store shared by every context on one shop.
//!
//! A [`Store`] keeps both collections in a [`PersistentNamespace`] when one
//! is injected, mirrors them in memory, and announces every change to local
//! subscribers and, through a [`BroadcastChannel`], to other contexts.
//! Storage and channel failures never reach callers: they are logged and the
//! mirror keeps serving.
//!
//! [`PersistentNamespace`]: bayline_core::PersistentNamespace
//! [`BroadcastChannel`]: bayline_core::BroadcastChannel

mod collection;
mod listener;
pub mod options;
pub mod store;

pub use options::StoreOptions;
pub use store::{Store, StoreBuilder};
