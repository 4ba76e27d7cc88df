// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value entry operations, scoped by namespace.

use bayline_core::BaylineError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Read the value under `key`, or `None` if absent.
pub async fn get(db: &Database, namespace: &str, key: &str) -> Result<Option<String>, BaylineError> {
    let namespace = namespace.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the value under `key` if it still equals `expected`, or insert it
/// if `expected` is `None` and the key is absent. Returns whether a row changed.
pub async fn swap(
    db: &Database,
    namespace: &str,
    key: &str,
    expected: Option<&str>,
    value: &str,
) -> Result<bool, BaylineError> {
    let namespace = namespace.to_string();
    let key = key.to_string();
    let expected = expected.map(str::to_string);
    let value = value.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = match expected {
                Some(expected) => conn.execute(
                    "UPDATE kv_entries SET
                         value = ?4,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE namespace = ?1 AND key = ?2 AND value = ?3",
                    params![namespace, key, expected, value],
                )?,
                None => conn.execute(
                    "INSERT INTO kv_entries (namespace, key, value) VALUES (?1, ?2, ?3)
                     ON CONFLICT (namespace, key) DO NOTHING",
                    params![namespace, key, value],
                )?,
            };
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// List the keys of a namespace in lexical order.
pub async fn list_keys(db: &Database, namespace: &str) -> Result<Vec<String>, BaylineError> {
    let namespace = namespace.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt =
                conn.prepare("SELECT key FROM kv_entries WHERE namespace = ?1 ORDER BY key")?;
            let keys = stmt
                .query_map(params![namespace], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn swap_then_get_returns_latest_value() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(swap(&db, "bay-1", "appointments", None, "[]").await.unwrap());
        assert!(swap(&db, "bay-1", "appointments", Some("[]"), r#"[{"id":"a"}]"#).await.unwrap());

        let value = get(&db, "bay-1", "appointments").await.unwrap();
        assert_eq!(value.as_deref(), Some(r#"[{"id":"a"}]"#));
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert_eq!(get(&db, "bay-1", "nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let db = Database::open_in_memory().await.unwrap();
        swap(&db, "front-desk", "notifications", None, "[1]").await.unwrap();
        swap(&db, "workshop", "notifications", None, "[2]").await.unwrap();

        assert_eq!(
            get(&db, "front-desk", "notifications").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert_eq!(list_keys(&db, "workshop").await.unwrap(), vec!["notifications"]);
    }

    #[tokio::test]
    async fn swap_on_absent_key_inserts_once() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(swap(&db, "ns", "k", None, "first").await.unwrap());
        assert!(!swap(&db, "ns", "k", None, "second").await.unwrap());
        assert_eq!(get(&db, "ns", "k").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn swap_only_replaces_matching_value() {
        let db = Database::open_in_memory().await.unwrap();
        swap(&db, "ns", "k", None, "v1").await.unwrap();
        assert!(!swap(&db, "ns", "k", Some("stale"), "v2").await.unwrap());
        assert!(swap(&db, "ns", "k", Some("v1"), "v2").await.unwrap());
        assert_eq!(get(&db, "ns", "k").await.unwrap().as_deref(), Some("v2"));
    }
}
