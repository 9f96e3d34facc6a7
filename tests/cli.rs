//! End-to-end tests for the `qsync` binary.
//!
//! Everything runs `--offline` against a snapshot in a temp dir; stdout is
//! piped, so output is JSON.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("records.json")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn qsync(&self) -> Command {
        let mut cmd = Command::cargo_bin("qsync").unwrap();
        cmd.env_remove("QSYNC_ENDPOINT")
            .env_remove("RUST_LOG")
            .env("QSYNC_CONFIG", self.path("config.json"))
            .arg("--store")
            .arg(self.store());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.qsync().args(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }
}

fn stderr_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .unwrap();
    serde_json::from_str(line).unwrap()
}

fn read_snapshot(path: &Path) -> Vec<Value> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_list_without_snapshot_shows_defaults() {
    let ws = Workspace::new();
    let records = ws.json(&["list", "--offline"]);

    assert_eq!(records.as_array().unwrap().len(), 12);
    assert!(!ws.store().exists());
}

#[test]
fn test_list_filters_by_keyword_and_category() {
    let ws = Workspace::new();

    let hungry = ws.json(&["list", "--keyword", "HUNGRY"]);
    assert_eq!(hungry.as_array().unwrap().len(), 1);

    let work = ws.json(&["list", "--category", "work"]);
    for record in work.as_array().unwrap() {
        assert_eq!(record["category"], "Work");
    }
}

#[test]
fn test_add_offline_queues_record() {
    let ws = Workspace::new();

    let added = ws.json(&["add", "Ship it", "Work", "--offline"]);
    assert_eq!(added["duplicate"], false);
    assert_eq!(added["record"]["synced"], false);
    assert!(added["record"]["id"].as_str().unwrap().starts_with("local-"));

    let snapshot = read_snapshot(&ws.store());
    assert_eq!(snapshot.len(), 13);

    let status = ws.json(&["status"]);
    assert_eq!(status["unsynced_count"], 1);
    assert_eq!(status["record_count"], 13);
    assert_eq!(status["snapshot_exists"], true);

    let again = ws.json(&["add", "Ship it", "Work", "--offline"]);
    assert_eq!(again["duplicate"], true);
    assert_eq!(read_snapshot(&ws.store()).len(), 13);
}

#[test]
fn test_add_blank_category_is_rejected() {
    let ws = Workspace::new();

    let assert = ws
        .qsync()
        .args(["add", "Text only", "   ", "--offline"])
        .assert()
        .code(4);

    let error = stderr_json(&assert.get_output().stderr);
    assert_eq!(error["error"]["code"], "REQUIRED_FIELD");
    assert!(!ws.store().exists());
}

#[test]
fn test_import_and_export_round_trip() {
    let ws = Workspace::new();
    let input = ws.path("import.json");
    fs::write(
        &input,
        r#"[
            {"text": "One", "category": "A"},
            {"quote": "Two", "author": "B"},
            {"text": "No category"}
        ]"#,
    )
    .unwrap();

    let stats = ws.json(&["import", input.to_str().unwrap(), "--offline"]);
    assert_eq!(stats["added"], 2);
    assert_eq!(stats["invalid"], 1);

    let output = ws.path("export.json");
    let exported = ws.json(&["export", "--output", output.to_str().unwrap()]);
    assert_eq!(exported["exported"], 14);

    let entries = read_snapshot(&output);
    assert_eq!(entries.len(), 14);
    assert_eq!(entries[13], serde_json::json!({"text": "Two", "category": "B"}));
}

#[test]
fn test_import_skips_malformed_entries() {
    let ws = Workspace::new();
    let input = ws.path("import.json");
    fs::write(
        &input,
        r#"[{"text": "One", "category": "A"}, 42, {"text": 5, "category": "X"}]"#,
    )
    .unwrap();

    let stats = ws.json(&["import", input.to_str().unwrap(), "--offline"]);
    assert_eq!(stats["added"], 1);
    assert_eq!(stats["invalid"], 2);
    assert_eq!(read_snapshot(&ws.store()).len(), 13);
}

#[test]
fn test_import_rejects_non_array() {
    let ws = Workspace::new();
    let input = ws.path("import.json");
    fs::write(&input, r#"{"text": "One"}"#).unwrap();

    ws.qsync()
        .args(["import", input.to_str().unwrap(), "--offline"])
        .assert()
        .code(4);
}

#[test]
fn test_sync_refuses_offline() {
    let ws = Workspace::new();

    let assert = ws.qsync().args(["sync", "--offline"]).assert().code(4);
    let error = stderr_json(&assert.get_output().stderr);
    assert_eq!(error["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn test_corrupt_snapshot_is_reported() {
    let ws = Workspace::new();
    fs::write(ws.store(), "[{\"text\": ").unwrap();

    let assert = ws.qsync().args(["list"]).assert().code(2);
    let error = stderr_json(&assert.get_output().stderr);
    assert_eq!(error["error"]["code"], "CORRUPT_SNAPSHOT");
}

#[test]
fn test_random_respects_category() {
    let ws = Workspace::new();

    let record = ws.json(&["random", "--category", "Perseverance"]);
    assert_eq!(record["category"], "Perseverance");

    let none = ws.json(&["random", "--keyword", "no such quote anywhere"]);
    assert!(none.is_null());
}

#[test]
fn test_categories_are_sorted() {
    let ws = Workspace::new();

    let categories = ws.json(&["categories"]);
    let names: Vec<&str> = categories
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn test_config_set_and_show() {
    let ws = Workspace::new();

    let saved = ws.json(&[
        "config",
        "set",
        "--interval",
        "30",
        "--endpoint",
        "http://localhost:3000/posts/",
        "--conflict-policy",
        "last_write_wins",
    ]);
    assert_eq!(saved["interval_secs"], 30);
    assert_eq!(saved["endpoint"], "http://localhost:3000/posts");

    let shown = ws.json(&["config", "show"]);
    assert_eq!(shown["settings"]["interval"], 30);
    assert_eq!(shown["settings"]["endpoint"], "http://localhost:3000/posts");
    assert_eq!(shown["settings"]["conflict_policy"], "last_write_wins");
}

#[test]
fn test_config_rejects_bad_endpoint() {
    let ws = Workspace::new();

    ws.qsync()
        .args(["config", "set", "--endpoint", "localhost:3000"])
        .assert()
        .code(7);
    assert!(!ws.path("config.json").exists());
}

#[test]
fn test_completions_mention_binary() {
    let ws = Workspace::new();
    let output = ws
        .qsync()
        .args(["completions", "bash"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert!(String::from_utf8_lossy(&output).contains("qsync"));
}
