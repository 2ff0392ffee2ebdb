//! Basic CLI E2E tests.
//!
//! Each test runs the built binary with HOME pointed at a fresh temp dir, so
//! the config file and database never touch the real ones.

use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_guardian-cli"))
        .args(args)
        .env("HOME", home.path())
        .env("GUARDIAN_ENV", "production")
        .env("GUARDIAN_POSITION", "28.6139,77.2090")
        .env_remove("GUARDIAN_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

/// Parse a stream of pretty-printed JSON documents.
fn json_stream(stdout: &str) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<serde_json::Value>()
        .map(|v| v.expect("Failed to parse JSON event"))
        .collect()
}

#[test]
fn test_config_defaults() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(&home, &["config", "get", "alert.countdown_seconds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (stdout, _, code) = run_cli(&home, &["config", "get", "alert.emergency_number"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "100");
}

#[test]
fn test_config_set_persists() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "journey.poll_interval_secs", "10"]);
    assert_eq!(code, 0);

    let (stdout, _, _) = run_cli(&home, &["config", "get", "journey.poll_interval_secs"]);
    assert_eq!(stdout.trim(), "10");
}

#[test]
fn test_config_unknown_key_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(&home, &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_journey_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let started = run_json(
        &home,
        &["journey", "start", "--from", "Home", "--to", "Office", "--minutes", "25", "--detach"],
    );
    assert_eq!(started["type"], "JourneyStarted");
    assert_eq!(started["estimated_duration_minutes"], 25);

    let (_, stderr, code) = run_cli(
        &home,
        &["journey", "start", "--from", "A", "--to", "B", "--detach"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("already active"));

    let ended = run_json(&home, &["journey", "complete"]);
    assert_eq!(ended["status"], "completed");

    let history = run_json(&home, &["journey", "history", "--json"]);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["startLocation"], "Home");
    assert_eq!(history[0]["status"], "completed");

    let (_, stderr, code) = run_cli(&home, &["journey", "cancel"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No journey is active"));
}

#[test]
fn test_journey_empty_label_rejected() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        &home,
        &["journey", "start", "--from", " ", "--to", "B", "--detach"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid input"));

    let history = run_json(&home, &["journey", "history", "--json"]);
    assert!(history.as_array().unwrap().is_empty());
}

#[test]
fn test_contacts_add_list_remove() {
    let home = tempfile::tempdir().unwrap();
    let contact = run_json(&home, &["contacts", "add", "Asha", "+91 98765 43210", "Sister"]);
    let id = contact["id"].as_str().unwrap().to_string();

    let list = run_json(&home, &["contacts", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let call = run_json(&home, &["contacts", "call", &id, "--dry-run"]);
    assert_eq!(call["type"], "CallPlaced");

    run_json(&home, &["contacts", "remove", &id]);
    let list = run_json(&home, &["contacts", "list"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn test_location_get_uses_configured_position() {
    let home = tempfile::tempdir().unwrap();
    let location = run_json(&home, &["location", "get"]);
    assert_eq!(location["latitude"], 28.6139);
    assert!(location["maps_link"]
        .as_str()
        .unwrap()
        .ends_with("28.6139,77.209"));
}

#[test]
fn test_sos_dry_run_triggers() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(&home, &["sos", "--dry-run", "--countdown", "1"]);
    assert_eq!(code, 0, "sos failed: {stderr}");

    let events = json_stream(&stdout);
    assert_eq!(events[0]["type"], "AlertArmed");
    assert_eq!(events.last().unwrap()["type"], "AlertTriggered");
    assert_eq!(events.last().unwrap()["emergency_number"], "100");
    assert!(stderr.contains("skipped"));
}

#[test]
fn test_sos_prints_arming_snapshot() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(&home, &["sos", "--dry-run", "--countdown", "1"]);
    assert_eq!(code, 0, "sos failed: {stderr}");

    let events = json_stream(&stdout);
    let snapshot = &events[1];
    assert_eq!(snapshot["state"], "arming");
    assert_eq!(snapshot["remaining_seconds"], 1);
    assert_eq!(snapshot["emergency_number"], "100");
    assert_eq!(snapshot["session"], events[0]["session"]);
}

#[cfg(unix)]
#[test]
fn test_sos_interrupt_cancels_without_dialling() {
    use std::process::Stdio;
    use std::time::Duration;

    let home = tempfile::tempdir().unwrap();
    let child = Command::new(env!("CARGO_BIN_EXE_guardian-cli"))
        .args(["sos", "--dry-run", "--countdown", "30"])
        .env("HOME", home.path())
        .env("GUARDIAN_ENV", "production")
        .env("GUARDIAN_POSITION", "28.6139,77.2090")
        .env_remove("GUARDIAN_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    std::thread::sleep(Duration::from_millis(1500));
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("Failed to send SIGINT");
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "sos failed: {stderr}");

    let events = json_stream(&stdout);
    let cancelled = &events[events.len() - 2];
    assert_eq!(cancelled["type"], "AlertCancelled");
    let reset = events.last().unwrap();
    assert_eq!(reset["state"], "idle");
    assert_eq!(reset["remaining_seconds"], 0);
    assert!(events.iter().all(|e| e["type"] != "AlertTriggered"));
    assert!(!stderr.contains("Dispatch:"));
}

#[test]
fn test_journey_share_waits_for_first_fix() {
    let home = tempfile::tempdir().unwrap();
    run_json(&home, &["journey", "start", "--from", "Home", "--to", "Office", "--detach"]);

    let (stdout, stderr, code) = run_cli(&home, &["journey", "share", "--dry-run"]);
    assert_eq!(code, 0, "share failed: {stderr}");
    let shared: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shared["type"], "LocationShared");
    assert_eq!(shared["location"]["latitude"], 28.6139);
    assert!(stderr.contains("1 skipped"));
}

#[test]
fn test_journey_emergency_uses_journey_number() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "journey.emergency_number", "1091"]);
    assert_eq!(code, 0);

    let call = run_json(&home, &["journey", "emergency", "--dry-run"]);
    assert_eq!(call["type"], "CallPlaced");
    assert_eq!(call["number"], "1091");

    let call = run_json(&home, &["journey", "emergency", "--number", "108", "--dry-run"]);
    assert_eq!(call["number"], "108");

    let (_, stderr, code) = run_cli(&home, &["journey", "emergency", "--number", " ", "--dry-run"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("journey.emergency_number"));
}
