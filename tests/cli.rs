//! Binary-level tests. Stdout is not a TTY here, so every command emits JSON.

use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

struct Env {
    _dir: TempDir,
    db: PathBuf,
    config: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("data").join("mediasync.db");
        let config = dir.path().join("config.json");
        Self {
            _dir: dir,
            db,
            config,
        }
    }

    fn initialized() -> Self {
        let env = Self::new();
        env.cmd(&["init"]).assert().success();
        env
    }

    fn cmd(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("msync").unwrap();
        cmd.env_remove("MSYNC_TEST_DB")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(&self.db)
            .arg("--config")
            .arg(&self.config)
            .args(args);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd(args).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn error_code(stderr: &[u8]) -> String {
    let value: Value = serde_json::from_slice(stderr).unwrap();
    value["error"]["code"].as_str().unwrap().to_string()
}

#[test]
fn init_creates_database_and_config() {
    let env = Env::new();
    let out = env.json(&["init"]);
    assert_eq!(out["config_created"], true);
    assert!(env.db.exists());
    assert!(env.config.exists());

    let again = env.cmd(&["init"]).output().unwrap();
    assert_eq!(again.status.code(), Some(2));
    assert_eq!(error_code(&again.stderr), "ALREADY_INITIALIZED");
}

#[test]
fn status_without_database_is_not_initialized() {
    let env = Env::new();
    let output = env.cmd(&["status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(error_code(&output.stderr), "NOT_INITIALIZED");
}

#[test]
fn status_for_fresh_account_reads_not_run_yet() {
    let env = Env::initialized();
    let out = env.json(&["status", "--account", "3"]);

    let rows = out["accounts"][0]["rows"].as_array().unwrap();
    let fast_pull = rows.iter().find(|r| r["mode"] == "fast_pull").unwrap();
    assert_eq!(fast_pull["summary"], "Not run yet.");
    assert_eq!(fast_pull["title"], "Quick Pull from trakt");
}

#[test]
fn run_with_failures_records_history() {
    let env = Env::initialized();
    let out = env.json(&[
        "run", "full", "--account", "1", "--items", "3", "--fail", "2", "--delay-ms", "0",
    ]);
    assert_eq!(out["result"]["success"], false);
    assert_eq!(out["result"]["errors"].as_array().unwrap().len(), 2);
    assert!(
        out["status"]
            .as_str()
            .unwrap()
            .ends_with("failed (2 errors, Unable to sync item #1).")
    );

    let history = env.json(&["history", "--account", "1"]);
    assert_eq!(history["count"], 1);
    assert_eq!(history["total"], 1);
    assert_eq!(history["results"][0]["mode"], "full");
}

#[test]
fn run_can_be_cancelled() {
    let env = Env::initialized();
    let out = env.json(&[
        "run",
        "push",
        "--account",
        "2",
        "--target",
        "show-section",
        "--items",
        "100",
        "--delay-ms",
        "50",
        "--cancel-after-ms",
        "0",
    ]);
    assert_eq!(out["result"]["success"], false);
    assert_eq!(out["result"]["cancelled"], true);
    assert_eq!(out["result"]["errors"].as_array().unwrap().len(), 0);
    assert!(!out["status"].as_str().unwrap().contains("was successful"));
}

#[test]
fn target_on_pull_is_rejected() {
    let env = Env::initialized();
    let output = env
        .cmd(&["run", "pull", "--account", "1", "--target", "2"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(error_code(&output.stderr), "INVALID_ARGUMENT");
}

#[test]
fn unknown_mode_is_invalid_argument() {
    let env = Env::initialized();
    let output = env.cmd(&["run", "sideways", "--account", "1"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn unknown_account_with_configured_accounts() {
    let env = Env::new();
    std::fs::write(&env.config, r#"{"accounts":[{"id":1,"name":"alice"}]}"#).unwrap();
    env.cmd(&["init"]).assert().success();

    let output = env.cmd(&["status", "--account", "9"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(error_code(&output.stderr), "ACCOUNT_NOT_FOUND");
}

#[test]
fn version_reports_package_version() {
    let env = Env::new();
    let out = env.json(&["version"]);
    assert_eq!(out["version"], env!("CARGO_PKG_VERSION"));
}
