// The cargo_bin! macro requires build script setup that's overkill for simple tests.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_help_flag() {
    let output = std::process::Command::new(cargo_bin("geosim"))
        .arg("--help")
        .output()
        .expect("failed to execute");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--scenario"));
    assert!(stdout.contains("--months"));
}

#[test]
fn test_missing_scenario_fails() {
    Command::new(cargo_bin("geosim"))
        .args(["--scenario", "/nonexistent/world.json", "-m", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent"));
}

#[test]
fn test_malformed_scenario_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ not json").unwrap();

    Command::new(cargo_bin("geosim"))
        .arg("--scenario")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse scenario"));
}

#[test]
fn test_demo_run_writes_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");

    Command::new(cargo_bin("geosim"))
        .args(["-m", "3", "--seed", "5", "--log-level", "warn"])
        .arg("--events")
        .arg(&events)
        .assert()
        .success();

    let text = fs::read_to_string(&events).unwrap();
    for line in text.lines() {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value["type"].is_string(), "{line}");
    }
}

#[test]
fn test_scripted_war_is_logged() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("war.json");
    fs::write(
        &scenario,
        r#"{
            "name": "scripted",
            "countries": [ { "code": "AAA", "name": "Aaa" } ],
            "commands": [ { "month": 0, "command": "declare_war", "target": "AAA" } ]
        }"#,
    )
    .unwrap();

    Command::new(cargo_bin("geosim"))
        .arg("--scenario")
        .arg(&scenario)
        .args(["-m", "1", "--log-level", "error"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"war_declared""#));
}
