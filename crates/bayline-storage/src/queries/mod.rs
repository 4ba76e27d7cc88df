// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the storage tables.

pub mod broadcast;
pub mod kv;
