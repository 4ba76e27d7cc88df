// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the PersistentNamespace trait.

use async_trait::async_trait;
use tracing::debug;

use bayline_config::model::StorageConfig;
use bayline_core::{AdapterType, BaylineError, HealthStatus, PersistentNamespace, PluginAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed persistent namespace.
///
/// Every context that opens the same database file with the same namespace
/// name shares its keys.
pub struct SqliteNamespace {
    db: Database,
    namespace: String,
}

impl SqliteNamespace {
    /// Wrap an already opened database.
    pub fn new(db: Database, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
        }
    }

    /// Open the database described by `config` and scope to its namespace.
    pub async fn open(config: &StorageConfig) -> Result<Self, BaylineError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(
            path = %config.database_path,
            namespace = %config.namespace,
            "SQLite namespace opened"
        );
        Ok(Self::new(db, config.namespace.clone()))
    }

    /// The database handle, for sharing with a [`SqliteChannel`](crate::SqliteChannel).
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteNamespace {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Namespace
    }

    async fn health_check(&self) -> Result<HealthStatus, BaylineError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BaylineError> {
        self.db.close().await
    }
}

#[async_trait]
impl PersistentNamespace for SqliteNamespace {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn read(&self, key: &str) -> Result<Option<String>, BaylineError> {
        queries::kv::get(&self.db, &self.namespace, key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, BaylineError> {
        let swapped = queries::kv::swap(&self.db, &self.namespace, key, expected, value).await?;
        if swapped {
            debug!(namespace = %self.namespace, key, bytes = value.len(), "namespace write");
        } else {
            debug!(namespace = %self.namespace, key, "namespace swap lost to a concurrent writer");
        }
        Ok(swapped)
    }

    async fn keys(&self) -> Result<Vec<String>, BaylineError> {
        queries::kv::list_keys(&self.db, &self.namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str, namespace: &str) -> StorageConfig {
        StorageConfig {
            enabled: true,
            database_path: path.to_string(),
            wal_mode: true,
            namespace: namespace.to_string(),
        }
    }

    #[tokio::test]
    async fn sqlite_namespace_implements_plugin_adapter() {
        let ns = SqliteNamespace::new(Database::open_in_memory().await.unwrap(), "bay");
        assert_eq!(ns.name(), "sqlite");
        assert_eq!(ns.version(), semver::Version::new(0, 1, 0));
        assert_eq!(ns.adapter_type(), AdapterType::Namespace);
        assert_eq!(ns.namespace(), "bay");
        assert_eq!(ns.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn values_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.db");
        let config = make_config(path.to_str().unwrap(), "front-desk");

        let ns = SqliteNamespace::open(&config).await.unwrap();
        ns.compare_and_swap("appointments", None, r#"[{"id":"a1"}]"#)
            .await
            .unwrap();
        ns.shutdown().await.unwrap();
        drop(ns);

        let reopened = SqliteNamespace::open(&config).await.unwrap();
        assert_eq!(
            reopened.read("appointments").await.unwrap().as_deref(),
            Some(r#"[{"id":"a1"}]"#)
        );
    }

    #[tokio::test]
    async fn two_handles_on_one_file_share_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let config = make_config(path.to_str().unwrap(), "shop");

        let terminal_a = SqliteNamespace::open(&config).await.unwrap();
        let terminal_b = SqliteNamespace::open(&config).await.unwrap();

        terminal_a
            .compare_and_swap("notifications", None, "[]")
            .await
            .unwrap();
        assert_eq!(
            terminal_b.read("notifications").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_expectation() {
        let ns = SqliteNamespace::new(Database::open_in_memory().await.unwrap(), "bay");
        assert!(ns.compare_and_swap("appointments", None, "[1]").await.unwrap());
        assert!(!ns.compare_and_swap("appointments", None, "[2]").await.unwrap());
        assert!(!ns.compare_and_swap("appointments", Some("[0]"), "[2]").await.unwrap());
        assert!(ns.compare_and_swap("appointments", Some("[1]"), "[2]").await.unwrap());
        assert_eq!(ns.read("appointments").await.unwrap().as_deref(), Some("[2]"));
    }

    #[tokio::test]
    async fn keys_are_sorted_and_scoped() {
        let db = Database::open_in_memory().await.unwrap();
        let ns = SqliteNamespace::new(db.clone(), "bay");
        let other = SqliteNamespace::new(db, "workshop");
        ns.compare_and_swap("notifications", None, "[]").await.unwrap();
        ns.compare_and_swap("appointments", None, "[]").await.unwrap();
        other.compare_and_swap("jobs", None, "[]").await.unwrap();

        assert_eq!(ns.keys().await.unwrap(), vec!["appointments", "notifications"]);
        assert_eq!(other.keys().await.unwrap(), vec!["jobs"]);
    }
}
