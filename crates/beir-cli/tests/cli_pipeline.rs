//! Runs the `beir` binary end to end over the HotSpot fixture reports.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::Value;

fn workspace_file(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
}

/// Runs in `cwd` with config discovery pointed at the same empty directory.
fn beir(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_beir"))
        .args(args)
        .current_dir(cwd)
        .env("HOME", cwd)
        .env("XDG_CONFIG_HOME", cwd)
        .env_remove("BEIR_LOG")
        .output()
        .expect("beir binary should start")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn reports_dir(root: &Path) -> PathBuf {
    let input = root.join("reports");
    fs::create_dir_all(&input).unwrap();
    let fixtures = workspace_file("crates/beir-hotspot/tests/fixtures");
    for name in ["plume_a.txt", "plume_b.TXT"] {
        fs::copy(fixtures.join(name), input.join(name)).unwrap();
    }
    input
}

#[test]
fn run_writes_every_artifact_and_the_audit_approves() {
    let root = tempfile::tempdir().unwrap();
    let input = reports_dir(root.path());
    let params = workspace_file("data/risk_parameters.json");
    let out = root.path().join("run");

    let output = beir(
        root.path(),
        &[
            "run",
            "--input",
            input.to_str().unwrap(),
            "--exposure-age",
            "30",
            "--attained-age",
            "60",
            "--params",
            params.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--run-id",
            "20260115093000",
        ],
    );
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let response = stdout_json(&output);
    assert_eq!(response["run_id"], "20260115093000");
    assert_eq!(response["extracted_records"], 3);
    assert_eq!(response["audit"]["rejected"], 0);
    assert!(response["computed"].as_u64().unwrap() > 0);

    let artifacts = response["artifacts"].as_array().unwrap();
    assert_eq!(artifacts.len(), 7);
    for artifact in artifacts {
        assert!(Path::new(artifact.as_str().unwrap()).is_file(), "{artifact}");
    }

    let log = out.join("4_execution_log_ee30_ea60_20260115093000.log");
    let validated = beir(root.path(), &["validate", "--log", log.to_str().unwrap()]);
    assert!(validated.status.success());
    assert_eq!(stdout_json(&validated)["log"]["errors"], Value::Array(vec![]));
}

#[test]
fn skip_audit_leaves_no_audit_report() {
    let root = tempfile::tempdir().unwrap();
    let input = reports_dir(root.path());
    let params = workspace_file("data/risk_parameters.json");
    let out = root.path().join("run");

    let output = beir(
        root.path(),
        &[
            "run",
            "--input",
            input.to_str().unwrap(),
            "--exposure-age",
            "10",
            "--attained-age",
            "40",
            "--params",
            params.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--run-id",
            "20260115093000",
            "--skip-audit",
            "--metric",
            "LAR",
        ],
    );
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["audit"], Value::Null);
    assert!(!out.join("6_shadow_audit_ee10_ea40_20260115093000.md").exists());
}

#[test]
fn missing_input_directory_fails_with_a_message() {
    let root = tempfile::tempdir().unwrap();
    let params = workspace_file("data/risk_parameters.json");

    let output = beir(
        root.path(),
        &[
            "run",
            "--input",
            "nowhere",
            "--exposure-age",
            "30",
            "--attained-age",
            "60",
            "--params",
            params.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("beir error:"));
}

#[test]
fn validate_reports_the_shipped_parameter_document() {
    let root = tempfile::tempdir().unwrap();
    let params = workspace_file("data/risk_parameters.json");

    let output = beir(root.path(), &["validate", "--params", params.to_str().unwrap()]);
    assert!(output.status.success());
    let response = stdout_json(&output);
    assert_eq!(response["params"]["valid"], true);
    assert_eq!(response["params"]["organs"], 23);
}

#[test]
fn schema_lists_and_prints_registered_schemas() {
    let root = tempfile::tempdir().unwrap();

    let listed = stdout_json(&beir(root.path(), &["schema", "--list"]));
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(names.contains(&"calc_log"));
    assert!(names.contains(&"risk_parameters"));

    let unknown = beir(root.path(), &["schema", "no_such_schema"]);
    assert_eq!(unknown.status.code(), Some(1));
}
