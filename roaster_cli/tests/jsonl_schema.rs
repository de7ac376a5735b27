use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sampling]
tick_ms = 10

[telemetry]
interval_ms = 100
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn summary_line(stdout: &str) -> serde_json::Value {
    let line = stdout
        .lines()
        .find(|l| l.starts_with('{') && l.contains("\"elapsed_roast_ms\""))
        .unwrap_or("");
    assert!(
        !line.is_empty(),
        "no JSON summary line found; stdout was: {stdout}"
    );
    serde_json::from_str(line).expect("valid JSON")
}

/// Validate the summary schema for a run stopped by a tick limit.
#[rstest]
fn json_summary_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("roaster").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--max-ticks")
        .arg("20");

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = summary_line(&String::from_utf8_lossy(&out));

    assert_eq!(v["reason"], "MaxTicks");
    assert_eq!(v["ticks"].as_u64(), Some(20));
    for key in [
        "elapsed_ms",
        "elapsed_roast_ms",
        "elapsed_total_ms",
    ] {
        assert!(v.get(key).and_then(|x| x.as_u64()).is_some(), "{key} should be u64");
    }
    for key in ["weight_g", "drop_percent"] {
        assert!(v.get(key).and_then(|x| x.as_f64()).is_some(), "{key} should be a number");
    }
    assert!(v.get("phase").and_then(|x| x.as_str()).is_some());

    // Fault must be null on a clean run
    assert!(v.get("fault").is_some());
    assert!(v["fault"].is_null());
}

/// A hot intake skips preheat; blocking tare leaves the roast waiting in Load.
#[rstest]
fn hot_intake_reaches_load() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("roaster").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("run")
        .arg("--max-ticks")
        .arg("20")
        .env("ROASTER_SIM_INTAKE_START_F", "400")
        .env("ROASTER_SIM_HEAT_RAW", "4095");

    let out = cmd.assert().success().get_output().stdout.clone();
    let v = summary_line(&String::from_utf8_lossy(&out));
    assert_eq!(v["phase"], "load");
    assert_eq!(v["elapsed_roast_ms"].as_u64(), Some(0));
}

/// Errors in JSON mode are a single object on stdout.
#[rstest]
fn json_error_object() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[display]\nfps = 0\n").unwrap();

    let out = Command::cargo_bin("roaster")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&path)
        .arg("self-check")
        .assert()
        .code(3)
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");
    assert_eq!(v["reason"], "Config");
    assert_eq!(v["exit_code"].as_i64(), Some(3));
    assert!(v["message"].as_str().unwrap().contains("display.fps"));
}
