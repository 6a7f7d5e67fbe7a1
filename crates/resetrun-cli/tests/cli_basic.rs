//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_resetrun-cli"))
        .env("RESETRUN_DATA_DIR", data_dir)
        .env_remove("RESETRUN_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut all = args.to_vec();
    all.push("--json");
    let (stdout, stderr, code) = run_cli(data_dir, &all);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout should be JSON")
}

#[test]
fn test_run_status_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let status = run_json(dir.path(), &["run", "status", "--today", "2024-01-01"]);
    assert_eq!(status["dayNumber"], 1);
    assert_eq!(status["store"]["runStartDate"], "2024-01-01");
    assert_eq!(status["cycle"].as_array().unwrap().len(), 7);
}

#[test]
fn test_complete_credits_day_once() {
    let dir = TempDir::new().unwrap();
    let first = run_json(dir.path(), &["run", "complete", "--today", "2024-01-01"]);
    assert_eq!(first["outcome"]["completedDayNow"], true);

    let second = run_json(dir.path(), &["run", "complete", "--today", "2024-01-01"]);
    assert_eq!(second["outcome"]["completedDayNow"], false);
    assert_eq!(second["outcome"]["alreadyCompletedToday"], true);
    assert_eq!(second["store"]["totalResets"], 2);
}

#[test]
fn test_seventh_day_completes_run() {
    let dir = TempDir::new().unwrap();
    let days = [
        "2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05", "2024-01-06",
    ];
    for day in days {
        run_json(dir.path(), &["run", "complete", "--today", day]);
    }
    let last = run_json(dir.path(), &["run", "complete", "--today", "2024-01-07"]);
    assert_eq!(last["outcome"]["hitDaySeven"], true);
    assert_eq!(last["outcome"]["completedCount"], 7);
}

#[test]
fn test_cycle_restarts_after_gap() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["run", "complete", "--today", "2024-01-01"]);
    let status = run_json(dir.path(), &["run", "status", "--today", "2024-01-10"]);
    assert_eq!(status["store"]["runStartDate"], "2024-01-10");
    assert_eq!(status["store"]["completedDates"], serde_json::json!([]));
    assert_eq!(status["store"]["totalResets"], 1);
}

#[test]
fn test_abandoned_session_is_not_counted() {
    let dir = TempDir::new().unwrap();
    let result = run_json(
        dir.path(),
        &["run", "complete", "--abandoned", "--today", "2024-01-01"],
    );
    assert_eq!(result["store"]["totalResets"], 0);
}

#[test]
fn test_goal_change_locks_until_tomorrow() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "goal", "2", "--today", "2024-01-01"]);
    assert_eq!(code, 0, "goal change failed: {stderr}");

    let (_, stderr, code) = run_cli(dir.path(), &["run", "goal", "3", "--today", "2024-01-01"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("locked until 2024-01-02"));

    let (_, _, code) = run_cli(dir.path(), &["run", "goal", "3", "--today", "2024-01-02"]);
    assert_eq!(code, 0);
    let status = run_json(dir.path(), &["run", "status", "--today", "2024-01-02"]);
    assert_eq!(status["store"]["dailyGoal"], 3);
}

#[test]
fn test_invalid_goal_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "goal", "4", "--today", "2024-01-01"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Daily goal"));
}

#[test]
fn test_begin_session_blocks_settings() {
    let dir = TempDir::new().unwrap();
    run_json(dir.path(), &["run", "begin", "--today", "2024-01-01"]);
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["settings", "set", "--duration", "10", "--today", "2024-01-01"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("locked"));
}

#[test]
fn test_signed_in_settings_round_trip() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["profile", "sign-in", "alice", "--today", "2024-01-01"]);
    assert_eq!(code, 0, "sign-in failed: {stderr}");

    let (_, stderr, code) = run_cli(
        dir.path(),
        &[
            "settings", "set", "--goal", "2", "--modes", "calm,focus", "--duration", "2",
            "--today", "2024-01-01",
        ],
    );
    assert_eq!(code, 0, "settings set failed: {stderr}");

    let shown = run_json(dir.path(), &["settings", "show", "--today", "2024-01-01"]);
    assert_eq!(shown["settings"]["dailyResets"], 2);
    assert_eq!(shown["settings"]["preferredModes"], serde_json::json!(["calm", "focus"]));
    assert_eq!(shown["settings"]["preferredDuration"], 2);
    assert_eq!(shown["lock"]["locked"], true);

    let profile = run_json(dir.path(), &["profile", "show", "--today", "2024-01-01"]);
    assert_eq!(profile["onboardingComplete"], true);
    assert_eq!(profile["preferences"]["dailyResets"], 2);
    assert_eq!(profile["locks"]["dailyLockDate"], "2024-01-01");
}

#[test]
fn test_sign_out_hides_preferences() {
    let dir = TempDir::new().unwrap();
    run_cli(dir.path(), &["profile", "sign-in", "alice", "--today", "2024-01-01"]);
    run_cli(dir.path(), &["settings", "set", "--modes", "body", "--today", "2024-01-01"]);

    let (stdout, _, code) = run_cli(dir.path(), &["profile", "sign-out"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("signed out"));

    let shown = run_json(dir.path(), &["settings", "show", "--today", "2024-01-02"]);
    assert_eq!(shown["settings"]["preferredModes"].as_array().unwrap().len(), 5);

    let (_, stderr, code) = run_cli(dir.path(), &["profile", "show"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not signed in"));
}

#[test]
fn test_bad_today_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["run", "status", "--today", "2024-1-5"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "remote.timeout_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "remote.timeout_secs", "3"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "remote.timeout_secs"]);
    assert_eq!(stdout.trim(), "3");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "remote.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_broken_remote_config_does_not_fail_completion() {
    let dir = TempDir::new().unwrap();
    for (key, value) in [
        ("account.uid", "alice"),
        ("remote.enabled", "true"),
        ("remote.base_url", "not a url"),
    ] {
        let (_, stderr, code) = run_cli(dir.path(), &["config", "set", key, value]);
        assert_eq!(code, 0, "config set {key} failed: {stderr}");
    }

    let (_, stderr, code) = run_cli(dir.path(), &["run", "complete", "--today", "2024-01-01"]);
    assert_eq!(code, 0, "completion failed: {stderr}");
    assert!(stderr.contains("profile not synced"));

    let status = run_json(dir.path(), &["run", "status", "--today", "2024-01-01"]);
    assert_eq!(status["store"]["totalResets"], 1);
}
