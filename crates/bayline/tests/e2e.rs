// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the `bayline` binary.
//!
//! Each test writes its own config pointing at a temp database, so every
//! invocation is a fresh process reading what earlier ones persisted.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

struct Shop {
    _dir: tempfile::TempDir,
    config: PathBuf,
}

impl Shop {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bayline.toml");
        write_config(&config, &dir.path().join("bayline.db"), "");
        Self { _dir: dir, config }
    }

    fn with_retention(max: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("bayline.toml");
        let extra = format!("\n[notifications]\nmax_retained = {max}\n");
        write_config(&config, &dir.path().join("bayline.db"), &extra);
        Self { _dir: dir, config }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_bayline"))
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut with_json = args.to_vec();
        with_json.push("--json");
        let output = self.run(&with_json);
        assert!(
            output.status.success(),
            "bayline {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn write_config(path: &Path, database: &Path, extra: &str) {
    let content = format!(
        "[storage]\ndatabase_path = \"{}\"\n\n[broadcast]\npoll_interval_ms = 20\n{extra}",
        database.display()
    );
    std::fs::write(path, content).unwrap();
}

// ---- Appointments ----

#[test]
fn appointments_persist_across_invocations() {
    let shop = Shop::new();
    let added = shop.json(&[
        "appointment",
        "add",
        r#"{"customerName":"Dana","service":"oil change","status":"pending"}"#,
    ]);
    let id = added["id"].as_str().unwrap().to_string();
    assert!(added["createdAt"].is_string());

    let listed = shop.json(&["appointment", "list"]);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());
    assert_eq!(listed[0]["customerName"], "Dana");
}

#[test]
fn stats_follow_status_changes() {
    let shop = Shop::new();
    let first = shop.json(&["appointment", "add", r#"{"status":"pending"}"#]);
    shop.json(&["appointment", "add", r#"{"status":"pending"}"#]);
    shop.json(&["appointment", "add", r#"{"status":"in-progress"}"#]);

    let id = first["id"].as_str().unwrap();
    let updated = shop.json(&["appointment", "set-status", id, "completed"]);
    assert_eq!(updated["status"], "completed");

    let stats = shop.json(&["stats"]);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["active"], 1);
    assert_eq!(stats["completed"], 1);
}

#[test]
fn invalid_record_exits_nonzero() {
    let shop = Shop::new();
    let output = shop.run(&["appointment", "add", "not json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not valid JSON"));

    let listed = shop.json(&["appointment", "list"]);
    assert!(listed.as_array().unwrap().is_empty());
}

#[test]
fn unknown_appointment_exits_nonzero() {
    let shop = Shop::new();
    let output = shop.run(&["appointment", "set-status", "APT-404", "completed"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("APT-404"));
}

// ---- Notifications ----

#[test]
fn notifications_mark_read_and_count_by_role() {
    let shop = Shop::new();
    shop.json(&[
        "notification",
        "add",
        r#"{"id":"N-1","type":"new-appointment","title":"New booking","forRole":"admin"}"#,
    ]);
    shop.json(&[
        "notification",
        "add",
        r#"{"id":"N-2","title":"Car ready","forRole":"employee"}"#,
    ]);

    assert_eq!(shop.json(&["notification", "unread"])["unread"], 2);
    assert_eq!(
        shop.json(&["notification", "unread", "--role", "admin"])["unread"],
        1
    );

    let marked = shop.json(&["notification", "mark-read", "N-1"]);
    assert_eq!(marked["read"], true);
    // marking twice is fine
    let again = shop.json(&["notification", "mark-read", "N-1"]);
    assert_eq!(again["read"], true);

    assert_eq!(shop.json(&["notification", "unread"])["unread"], 1);
    let employee = shop.json(&["notification", "list", "--role", "employee"]);
    let employee = employee.as_array().unwrap();
    assert_eq!(employee.len(), 1);
    assert_eq!(employee[0]["id"], "N-2");
}

#[test]
fn retention_keeps_newest_notifications() {
    let shop = Shop::with_retention(2);
    for id in ["N-1", "N-2", "N-3"] {
        let record = format!(r#"{{"id":"{id}","title":"alert {id}"}}"#);
        shop.json(&["notification", "add", &record]);
    }

    let listed = shop.json(&["notification", "list"]);
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["N-2", "N-3"]);
}

// ---- Clear ----

#[test]
fn clear_empties_both_collections() {
    let shop = Shop::new();
    shop.json(&["appointment", "add", r#"{"status":"pending"}"#]);
    shop.json(&["notification", "add", r#"{"title":"New booking"}"#]);

    shop.json(&["clear"]);

    assert!(shop.json(&["appointment", "list"]).as_array().unwrap().is_empty());
    assert!(shop.json(&["notification", "list"]).as_array().unwrap().is_empty());
    assert_eq!(shop.json(&["stats"])["total"], 0);
}

// ---- Doctor ----

#[test]
fn doctor_passes_on_fresh_database() {
    let shop = Shop::new();
    shop.json(&["appointment", "add", r#"{"status":"pending"}"#]);

    let output = shop.run(&["doctor", "--plain", "--deep"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stdout)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[OK]   Appointments"));
    assert!(stdout.contains("1 record(s)"));
}

#[test]
fn bad_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bayline.toml");
    std::fs::write(&config, "[storage]\ndatabse_path = \"x.db\"\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_bayline"))
        .arg("--config")
        .arg(&config)
        .arg("stats")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
