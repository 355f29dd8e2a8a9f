//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory and checks
//! the JSON it prints.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    run_cli_with_input(dir, args, "")
}

fn run_cli_with_input(dir: &Path, args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_focusflow"))
        .args(args)
        .env("FOCUSFLOW_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let out = run_cli(dir, args);
    assert_eq!(
        out.status.code(),
        Some(0),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// Commands may print several JSON documents back to back.
fn json_docs(stdout: &str) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<serde_json::Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is not JSON")
}

fn types(stdout: &str) -> Vec<String> {
    json_docs(stdout)
        .iter()
        .filter_map(|v| v["type"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn test_status_on_fresh_install() {
    let dir = tempfile::tempdir().unwrap();
    let docs = json_docs(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(docs[0]["type"], "StateSnapshot");
    assert_eq!(docs[0]["state"], "idle");
    assert_eq!(docs[0]["remaining_ms"], 0);
}

#[test]
fn test_start_pause_resume() {
    let dir = tempfile::tempdir().unwrap();
    let docs = json_docs(&run_ok(dir.path(), &["timer", "start", "--minutes", "25"]));
    assert_eq!(docs[0]["type"], "TimerStarted");
    assert_eq!(docs[0]["session"]["planned_secs"], 1500);
    assert_eq!(docs[0]["session"]["kind"], "work");

    let out = run_cli(dir.path(), &["timer", "start"]);
    assert_ne!(out.status.code(), Some(0), "second start should fail");

    assert_eq!(types(&run_ok(dir.path(), &["timer", "pause"])), ["TimerPaused"]);
    let status = json_docs(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status[0]["state"], "paused");

    assert_eq!(types(&run_ok(dir.path(), &["timer", "resume"])), ["TimerResumed"]);
    let status = json_docs(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status[0]["state"], "running");
}

#[test]
fn test_non_strict_quit_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["timer", "start", "--minutes", "10"]);

    let out = run_cli_with_input(dir.path(), &["quit"], "");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(types(&stdout), ["TimerStopped", "SessionQuit"]);
    let quit = &json_docs(&stdout)[1];
    assert_eq!(quit["session"]["status"], "quit_early");

    let history = json_docs(&run_ok(dir.path(), &["stats", "history"]));
    assert_eq!(history[0].as_array().unwrap().len(), 1);

    let all = json_docs(&run_ok(dir.path(), &["stats", "all"]));
    assert_eq!(all[0]["quit_work"], 1);

    let streak = json_docs(&run_ok(dir.path(), &["stats", "streak"]));
    assert_eq!(streak[0]["total_quit"], 1);
    assert_eq!(streak[0]["current_streak"], 0);
}

#[test]
fn test_quit_without_session_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_cli(dir.path(), &["quit"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("no session in progress"));
}

#[test]
fn test_strict_mode_blocks_reset() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run_ok(dir.path(), &["strict", "enable"]).contains("enabled"));
    let status = json_docs(&run_ok(dir.path(), &["strict", "status"]));
    assert_eq!(status[0]["active"], true);
    assert!(status[0]["grace_remaining_secs"].as_i64().unwrap() > 0);

    run_ok(dir.path(), &["timer", "start", "--minutes", "5"]);
    let out = run_cli(dir.path(), &["timer", "reset"]);
    assert_eq!(out.status.code(), Some(1));

    // Inside the grace window the disable is immediate.
    assert!(run_ok(dir.path(), &["strict", "disable"]).contains("disabled"));
    let status = json_docs(&run_ok(dir.path(), &["strict", "status"]));
    assert_eq!(status[0]["active"], false);
}

#[test]
fn test_config_cannot_switch_off_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["strict", "enable"]);

    for (key, value) in [
        ("strict_mode.enabled", "false"),
        ("strict_mode.enabled_at", "2030-01-01T00:00:00Z"),
        ("strict_mode.disable_at", "2000-01-01T00:00:00Z"),
    ] {
        let out = run_cli(dir.path(), &["config", "set", key, value]);
        assert_eq!(out.status.code(), Some(1), "{key} was accepted");
        assert!(String::from_utf8_lossy(&out.stderr).contains("focusflow strict"));
    }
    // Preferences inside the table are still plain settings.
    run_ok(dir.path(), &["config", "set", "strict_mode.tone", "gentle"]);

    run_ok(dir.path(), &["config", "set", "timer.work_minutes", "50"]);
    run_ok(dir.path(), &["config", "reset"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "timer.work_minutes"]).trim(), "25");

    let status = json_docs(&run_ok(dir.path(), &["strict", "status"]));
    assert_eq!(status[0]["active"], true);
    assert_eq!(status[0]["tone"], "gentle");
}

#[test]
fn test_enable_reports_already_enabled() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["strict", "enable"]).trim(), "strict mode enabled");
    assert_eq!(
        run_ok(dir.path(), &["strict", "enable"]).trim(),
        "strict mode is already enabled"
    );
}

#[test]
fn test_strict_settings() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["strict", "challenge", "math"]);
    run_ok(dir.path(), &["strict", "phrase", "Back to the essay"]);
    let status = json_docs(&run_ok(dir.path(), &["strict", "status"]));
    assert_eq!(status[0]["challenge_type"], "math");
    assert_eq!(status[0]["tone"], "custom");
    assert_eq!(status[0]["phrase"], "Back to the essay");

    let out = run_cli(dir.path(), &["strict", "tone", "furious"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "timer.work_minutes"]).trim(), "25");
    run_ok(dir.path(), &["config", "set", "timer.work_minutes", "50"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "timer.work_minutes"]).trim(), "50");

    let docs = json_docs(&run_ok(dir.path(), &["timer", "start"]));
    assert_eq!(docs[0]["session"]["planned_secs"], 3000);

    let out = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_completions() {
    let dir = tempfile::tempdir().unwrap();
    let script = run_ok(dir.path(), &["completions", "bash"]);
    assert!(script.contains("focusflow"));
}
