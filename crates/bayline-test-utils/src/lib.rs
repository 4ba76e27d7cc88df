// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Bayline store tests.
//!
//! Provides mock adapters for fast, deterministic tests without a database.
//!
//! # Components
//!
//! - [`MockNamespace`] - In-memory namespace with read/write fault injection
//! - [`MockChannel`] - Broadcast channel with message injection and capture
//! - [`fixtures`] - Sample appointment and notification drafts

pub mod fixtures;
pub mod mock_channel;
pub mod mock_namespace;

pub use mock_channel::MockChannel;
pub use mock_namespace::MockNamespace;
