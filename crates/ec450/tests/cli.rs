#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/ec450cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn ec450(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ec450"))
        .args(args)
        .args(["--log-level", "off"])
        .env_remove("EC450_CONFIG")
        .output()
        .expect("ec450 should run")
}

fn simulate(dir: &Path, extra: &[&str]) -> PathBuf {
    let capture = dir.join("capture.bin");
    let mut args = vec!["simulate", capture.to_str().expect("utf-8 path")];
    args.extend_from_slice(extra);
    let output = ec450(&args);
    assert!(output.status.success(), "simulate failed: {output:?}");
    capture
}

fn last_json_line(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().last().expect("stdout should not be empty");
    serde_json::from_str(line).expect("last line should be JSON")
}

#[test]
fn simulate_then_decode_reports_every_record() {
    let dir = unique_temp_dir("roundtrip");
    let capture = simulate(&dir, &["--cycles", "3", "--filler", "2"]);

    // 6 + 16 + 28 + 28 bytes of frames and 8 filler bytes per cycle.
    let size = std::fs::metadata(&capture).expect("capture exists").len();
    assert_eq!(size, 3 * 86);

    let output = ec450(&[
        "decode",
        capture.to_str().expect("utf-8 path"),
        "--summary-only",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "decode failed: {output:?}");

    let report = last_json_line(&output);
    assert_eq!(report["schema_id"], "ec450/cli/v1/decode-report.json");
    assert_eq!(report["stats"]["records"], 12);
    assert_eq!(report["stats"]["reader"]["frames"], 12);
    assert_eq!(report["stats"]["reader"]["filler_bytes"], 24);
    assert_eq!(report["stats"]["reader"]["dropped_bytes"], 0);
    assert_eq!(report["trailing_bytes"], 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_prints_one_line_per_publication() {
    let dir = unique_temp_dir("publications");
    let capture = simulate(&dir, &["--cycles", "1"]);

    let output = ec450(&[
        "decode",
        capture.to_str().expect("utf-8 path"),
        "--chunk-size",
        "3",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "decode failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    // voltage + 5 current + 5 power + 5 energy, then the report.
    assert_eq!(lines.len(), 17);

    let first: serde_json::Value = serde_json::from_str(lines[0]).expect("publication is JSON");
    assert_eq!(first["channel"], "voltage");
    assert_eq!(first["unit"], "V");
    assert!(lines[..16].iter().all(|l| !l.contains("\"channel\":\"aggregate\"")));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupted_frames_are_counted_not_decoded() {
    let dir = unique_temp_dir("corrupt");
    let capture = simulate(&dir, &["--cycles", "2", "--corrupt-every", "4"]);

    let output = ec450(&[
        "decode",
        capture.to_str().expect("utf-8 path"),
        "--summary-only",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "decode failed: {output:?}");

    let report = last_json_line(&output);
    assert_eq!(report["stats"]["reader"]["bad_checksum"], 2);
    assert_eq!(report["stats"]["records"], 6);
    assert_eq!(report["state"]["energy_total"][1], 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_capture_fails() {
    let output = ec450(&["decode", "/nonexistent/ec450/capture.bin"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("open failed"));
}

#[test]
fn config_defaults_match_device_line() {
    let output = ec450(&["config", "--format", "json"]);
    assert!(output.status.success(), "config failed: {output:?}");

    let out = last_json_line(&output);
    assert_eq!(out["line_ok"], true);
    assert_eq!(out["config"]["line"]["baud_rate"], 19200);
    assert_eq!(out["config"]["max_msg_length"], 0x30);
}

#[test]
fn config_reports_line_mismatch() {
    let dir = unique_temp_dir("config");
    let path = dir.join("ec450.json");
    std::fs::write(&path, r#"{ "line": { "baud_rate": 9600 } }"#).expect("config written");

    let output = ec450(&[
        "config",
        "--format",
        "json",
        "--config",
        path.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let out = last_json_line(&output);
    assert_eq!(out["line_ok"], false);
    assert_eq!(out["line_mismatches"][0], "baud rate 9600 (expected 19200)");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_config_is_rejected() {
    let dir = unique_temp_dir("bad-config");
    let path = dir.join("ec450.json");
    std::fs::write(&path, r#"{ "sensors": { "current": [7] } }"#).expect("config written");

    let output = ec450(&["version", "--config", path.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(78));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = ec450(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("ec450 {}", env!("CARGO_PKG_VERSION"))
    );
}
