// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory persistent namespace with fault injection.
//!
//! Clones share the same backing map, so two stores built on clones of one
//! `MockNamespace` behave like two contexts on one origin.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use bayline_core::{AdapterType, BaylineError, HealthStatus, PersistentNamespace, PluginAdapter};

#[derive(Clone)]
pub struct MockNamespace {
    name: String,
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl MockNamespace {
    pub fn new() -> Self {
        Self::named("mock")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store a raw value, bypassing fault injection. Useful for planting
    /// malformed data.
    pub async fn seed(&self, key: &str, raw: &str) {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), raw.to_string());
    }

    /// Current raw value under `key`, bypassing fault injection.
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    /// Make every subsequent read fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write (including swaps) fail until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), BaylineError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), BaylineError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("write"));
        }
        Ok(())
    }
}

impl Default for MockNamespace {
    fn default() -> Self {
        Self::new()
    }
}

fn injected(op: &str) -> BaylineError {
    BaylineError::Storage {
        source: format!("injected {op} failure").into(),
    }
}

#[async_trait]
impl PluginAdapter for MockNamespace {
    fn name(&self) -> &str {
        "mock-namespace"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Namespace
    }

    async fn health_check(&self) -> Result<HealthStatus, BaylineError> {
        if self.fail_reads.load(Ordering::SeqCst) || self.fail_writes.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Degraded("fault injection active".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BaylineError> {
        Ok(())
    }
}

#[async_trait]
impl PersistentNamespace for MockNamespace {
    fn namespace(&self) -> &str {
        &self.name
    }

    async fn read(&self, key: &str) -> Result<Option<String>, BaylineError> {
        self.check_reads()?;
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, BaylineError> {
        self.check_writes()?;
        let mut entries = self.entries.lock().await;
        if entries.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>, BaylineError> {
        self.check_reads()?;
        Ok(self.entries.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_entries() {
        let ns = MockNamespace::new();
        let other = ns.clone();
        ns.compare_and_swap("appointments", None, "[]").await.unwrap();
        assert_eq!(other.read("appointments").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(other.write_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_storage_errors() {
        let ns = MockNamespace::new();
        ns.fail_reads(true);
        assert!(matches!(
            ns.read("k").await,
            Err(BaylineError::Storage { .. })
        ));
        ns.fail_reads(false);

        ns.fail_writes(true);
        assert!(ns.compare_and_swap("k", None, "v").await.is_err());
        assert!(matches!(
            ns.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
        assert_eq!(ns.raw("k").await, None);
    }

    #[tokio::test]
    async fn seeded_values_ignore_faults() {
        let ns = MockNamespace::new();
        ns.fail_writes(true);
        ns.seed("appointments", "{not json").await;
        assert_eq!(ns.read("appointments").await.unwrap().as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn swap_checks_expected_value() {
        let ns = MockNamespace::new();
        assert!(ns.compare_and_swap("k", None, "a").await.unwrap());
        assert!(!ns.compare_and_swap("k", None, "b").await.unwrap());
        assert!(ns.compare_and_swap("k", Some("a"), "b").await.unwrap());
        assert_eq!(ns.raw("k").await.as_deref(), Some("b"));
    }
}
