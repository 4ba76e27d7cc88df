// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `bayline doctor` command implementation.
//!
//! Runs diagnostic checks against the configured database and the collections
//! stored in it.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use bayline_config::model::BaylineConfig;
use bayline_config::model::BroadcastConfig;
use bayline_core::{
    Appointment, BroadcastChannel, HealthStatus, Notification, PersistentNamespace, PluginAdapter,
};
use bayline_storage::{Database, SqliteChannel, SqliteNamespace, queries};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `bayline doctor` command. Returns the number of failed checks.
///
/// With `deep`, also runs the SQLite integrity check and reports file size.
/// With `plain`, disables colored output.
pub async fn run_doctor(config: &BaylineConfig, deep: bool, plain: bool) -> usize {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = collect_checks(config, deep).await;

    println!();
    println!("  bayline doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", render_line(result, use_color));
    }
    println!();

    let issues = fail_count + warn_count;
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count
}

async fn collect_checks(config: &BaylineConfig, deep: bool) -> Vec<CheckResult> {
    let start = Instant::now();
    let mut results = vec![CheckResult::new(
        "Configuration",
        CheckStatus::Pass,
        "valid",
        start,
    )];

    if !config.storage.enabled {
        results.push(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            "storage disabled, records are not persisted",
            Instant::now(),
        ));
        return results;
    }

    let path = config.storage.database_path.as_str();
    let db = match check_database(path, config.storage.wal_mode).await {
        Ok((db, result)) => {
            results.push(result);
            db
        }
        Err(result) => {
            results.push(result);
            return results;
        }
    };

    let namespace = SqliteNamespace::new(db.clone(), config.storage.namespace.clone());
    results.push(check_namespace(&namespace).await);
    results.push(
        check_collection::<Appointment>(&namespace, "Appointments", &config.store.appointments_key)
            .await,
    );
    results.push(
        check_collection::<Notification>(
            &namespace,
            "Notifications",
            &config.store.notifications_key,
        )
        .await,
    );
    if config.broadcast.enabled {
        results.push(check_broadcast(&db, &config.broadcast).await);
    }

    if deep {
        results.push(check_db_integrity(&db).await);
        results.push(check_file_size(path));
    }
    results
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    use colored::Colorize;

    let duration_ms = result.duration.as_millis();
    if !use_color {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!(
            "    {tag} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }

    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

/// Check the database file exists and opens with migrations applied.
async fn check_database(path: &str, wal_mode: bool) -> Result<(Database, CheckResult), CheckResult> {
    let start = Instant::now();
    if !Path::new(path).exists() {
        return Err(CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {path} (will be created on first write)"),
            start,
        ));
    }

    match Database::open_with(path, wal_mode).await {
        Ok(db) => Ok((
            db,
            CheckResult::new("Database", CheckStatus::Pass, "connected", start),
        )),
        Err(e) => Err(CheckResult::new(
            "Database",
            CheckStatus::Fail,
            format!("open failed: {e}"),
            start,
        )),
    }
}

/// Check one collection decodes. Malformed data is a warning: the store
/// treats it as empty and repairs it on the next write.
async fn check_collection<R: serde::de::DeserializeOwned>(
    namespace: &SqliteNamespace,
    name: &str,
    key: &str,
) -> CheckResult {
    let start = Instant::now();
    match namespace.read(key).await {
        Ok(None) => CheckResult::new(name, CheckStatus::Pass, "empty", start),
        Ok(Some(raw)) => match serde_json::from_str::<Vec<R>>(&raw) {
            Ok(records) => {
                CheckResult::new(name, CheckStatus::Pass, format!("{} record(s)", records.len()), start)
            }
            Err(e) => CheckResult::new(
                name,
                CheckStatus::Warn,
                format!("malformed under `{key}`: {e}"),
                start,
            ),
        },
        Err(e) => CheckResult::new(name, CheckStatus::Fail, format!("read failed: {e}"), start),
    }
}

fn health_result(name: &str, health: HealthStatus, detail: String, start: Instant) -> CheckResult {
    match health {
        HealthStatus::Healthy => CheckResult::new(name, CheckStatus::Pass, detail, start),
        HealthStatus::Degraded(reason) => CheckResult::new(name, CheckStatus::Warn, reason, start),
        HealthStatus::Unhealthy(reason) => CheckResult::new(name, CheckStatus::Fail, reason, start),
    }
}

/// Adapter health plus the keys the namespace holds.
async fn check_namespace(namespace: &SqliteNamespace) -> CheckResult {
    let start = Instant::now();
    let health = match namespace.health_check().await {
        Ok(health) => health,
        Err(e) => {
            return CheckResult::new(
                "Namespace",
                CheckStatus::Fail,
                format!("health check failed: {e}"),
                start,
            );
        }
    };
    let detail = match namespace.keys().await {
        Ok(keys) if keys.is_empty() => format!("`{}` holds no keys", namespace.namespace()),
        Ok(keys) => format!("`{}` holds {}", namespace.namespace(), keys.join(", ")),
        Err(e) => {
            return CheckResult::new(
                "Namespace",
                CheckStatus::Fail,
                format!("key listing failed: {e}"),
                start,
            );
        }
    };
    health_result("Namespace", health, detail, start)
}

/// Adapter health of the broadcast channel, and the last message posted to it.
async fn check_broadcast(db: &Database, config: &BroadcastConfig) -> CheckResult {
    let start = Instant::now();
    let channel = SqliteChannel::new(db.clone(), config);
    let health = match channel.health_check().await {
        Ok(health) => health,
        Err(e) => {
            return CheckResult::new(
                "Broadcast",
                CheckStatus::Fail,
                format!("health check failed: {e}"),
                start,
            );
        }
    };
    let name = channel.channel_name();
    let detail = match queries::broadcast::latest_id(db, name).await {
        Ok(0) => format!("`{name}` idle"),
        Ok(id) => format!("`{name}` last message #{id}"),
        Err(e) => {
            return CheckResult::new(
                "Broadcast",
                CheckStatus::Fail,
                format!("query failed: {e}"),
                start,
            );
        }
    };
    health_result("Broadcast", health, detail, start)
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db: &Database) -> CheckResult {
    let start = Instant::now();
    match db.integrity_check().await {
        Ok(rows) if rows.len() == 1 && rows[0] == "ok" => {
            CheckResult::new("DB integrity", CheckStatus::Pass, "ok", start)
        }
        Ok(rows) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("{} issue(s) found", rows.len()),
            start,
        ),
        Err(e) => CheckResult::new(
            "DB integrity",
            CheckStatus::Fail,
            format!("check failed: {e}"),
            start,
        ),
    }
}

/// Deep check: database file size.
fn check_file_size(path: &str) -> CheckResult {
    let start = Instant::now();
    match std::fs::metadata(path) {
        Ok(meta) => {
            let size_mb = meta.len() as f64 / (1024.0 * 1024.0);
            CheckResult::new("File size", CheckStatus::Pass, format!("{size_mb:.1} MB"), start)
        }
        Err(e) => CheckResult::new("File size", CheckStatus::Warn, format!("cannot access: {e}"), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(path: &Path) -> BaylineConfig {
        let mut config = BaylineConfig::default();
        config.storage.database_path = path.to_string_lossy().into_owned();
        config
    }

    fn status_of<'a>(results: &'a [CheckResult], name: &str) -> &'a CheckStatus {
        &results
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("missing check {name}"))
            .status
    }

    #[tokio::test]
    async fn missing_database_warns_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_at(&dir.path().join("absent.db"));

        let results = collect_checks(&config, true).await;
        assert_eq!(results.len(), 2);
        assert_eq!(status_of(&results, "Database"), &CheckStatus::Warn);
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn healthy_database_passes_deep_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bayline.db");
        let namespace = SqliteNamespace::open(&config_at(&path).storage).await.unwrap();
        namespace
            .compare_and_swap("appointments", None, "[]")
            .await
            .unwrap();
        namespace.shutdown().await.unwrap();

        let results = collect_checks(&config_at(&path), true).await;
        for name in [
            "Database",
            "Namespace",
            "Appointments",
            "Notifications",
            "Broadcast",
            "DB integrity",
        ] {
            assert_eq!(status_of(&results, name), &CheckStatus::Pass, "{name}");
        }
    }

    #[tokio::test]
    async fn namespace_check_lists_keys() {
        let namespace = SqliteNamespace::new(Database::open_in_memory().await.unwrap(), "front-desk");
        assert!(check_namespace(&namespace).await.message.contains("holds no keys"));

        namespace
            .compare_and_swap("appointments", None, "[]")
            .await
            .unwrap();
        let result = check_namespace(&namespace).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert_eq!(result.message, "`front-desk` holds appointments");
    }

    #[tokio::test]
    async fn broadcast_check_reports_last_message() {
        let db = Database::open_in_memory().await.unwrap();
        let config = BroadcastConfig::default();
        assert!(check_broadcast(&db, &config).await.message.ends_with("idle"));

        SqliteChannel::new(db.clone(), &config)
            .post("{}")
            .await
            .unwrap();
        let result = check_broadcast(&db, &config).await;
        assert_eq!(result.status, CheckStatus::Pass);
        assert!(result.message.contains("last message #1"));
    }

    #[tokio::test]
    async fn malformed_collection_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bayline.db");
        let namespace = SqliteNamespace::open(&config_at(&path).storage).await.unwrap();
        namespace
            .compare_and_swap("notifications", None, "{broken")
            .await
            .unwrap();

        let results = collect_checks(&config_at(&path), false).await;
        assert_eq!(status_of(&results, "Notifications"), &CheckStatus::Warn);
        assert_eq!(status_of(&results, "Appointments"), &CheckStatus::Pass);
    }

    #[tokio::test]
    async fn disabled_storage_is_a_warning() {
        let mut config = BaylineConfig::default();
        config.storage.enabled = false;
        let results = collect_checks(&config, false).await;
        assert_eq!(status_of(&results, "Database"), &CheckStatus::Warn);
    }

    #[test]
    fn plain_rendering_uses_tags() {
        let result = CheckResult {
            name: "Database".to_string(),
            status: CheckStatus::Fail,
            message: "open failed".to_string(),
            duration: Duration::from_millis(3),
        };
        let line = render_line(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("open failed (3ms)"));
    }
}
