// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent key-value namespace trait.

use async_trait::async_trait;

use crate::error::BaylineError;
use crate::traits::adapter::PluginAdapter;

/// A string-keyed, string-valued store scoped to one namespace and shared by
/// every context that opens the same namespace.
///
/// Values are opaque to the namespace; the store keeps one JSON array per key.
/// Every write is a compare-and-swap of the whole value.
#[async_trait]
pub trait PersistentNamespace: PluginAdapter {
    /// Name of the namespace all keys live under.
    fn namespace(&self) -> &str;

    /// Read the value stored under `key`, or `None` if the key was never written.
    async fn read(&self, key: &str) -> Result<Option<String>, BaylineError>;

    /// Store `value` under `key` only if the current value equals `expected`
    /// (`None` meaning the key is absent). Returns `false` when another writer
    /// got there first and nothing was stored.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, BaylineError>;

    /// List the keys present in the namespace, sorted.
    async fn keys(&self) -> Result<Vec<String>, BaylineError>;
}
