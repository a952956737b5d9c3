//! Integration tests for the gradeflow CLI surface: help, config, exit codes

mod support;

use predicates::prelude::*;
use support::{gradeflow, setup_project, write};
use tempfile::tempdir;

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let dir = tempdir().unwrap();
    gradeflow(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: gradeflow"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("index"))
        .stdout(predicate::str::contains("grade"))
        .stdout(predicate::str::contains("similar"));
}

#[test]
fn test_version_flag() {
    let dir = tempdir().unwrap();
    gradeflow(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gradeflow"));
}

#[test]
fn test_no_command_prints_banner() {
    let dir = tempdir().unwrap();
    gradeflow(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("gradeflow --help"));
}

#[test]
fn test_unknown_format_exit_code_2() {
    let dir = tempdir().unwrap();
    gradeflow(dir.path())
        .args(["--format", "invalid", "init"])
        .assert()
        .code(2);
}

#[test]
fn test_grade_requires_an_index_source() {
    let dir = setup_project();
    gradeflow(dir.path())
        .args(["grade", "submission"])
        .assert()
        .code(2);
}

// ============================================================================
// init
// ============================================================================

#[test]
fn test_init_writes_default_config() {
    let dir = tempdir().unwrap();
    gradeflow(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default configuration"));

    let written = std::fs::read_to_string(dir.path().join("gradeflow.toml")).unwrap();
    assert!(written.contains("max_size = 300"));
    assert!(written.contains("App component implemented"));
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    gradeflow(dir.path()).arg("init").assert().success();

    gradeflow(dir.path())
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    gradeflow(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_bad_rubric_weights_exit_code_2() {
    let dir = setup_project();
    write(
        dir.path(),
        "gradeflow.toml",
        "[[rubric.criteria]]\nlabel = \"Only\"\nweight = 90\ndetector = { contains = \"App\" }\n",
    );

    gradeflow(dir.path())
        .args(["grade", "submission", "--reference", "reference"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sum to 100"));
    assert!(!dir.path().join("feedback.txt").exists());
}

#[test]
fn test_overlap_not_below_max_size_exit_code_2() {
    let dir = setup_project();
    write(
        dir.path(),
        "custom.toml",
        "[chunking]\nmax_size = 50\noverlap = 50\n",
    );

    gradeflow(dir.path())
        .args([
            "--config",
            "custom.toml",
            "grade",
            "submission",
            "--reference",
            "reference",
        ])
        .assert()
        .code(2);
}

#[test]
fn test_json_error_envelope() {
    let dir = setup_project();
    let output = gradeflow(dir.path())
        .args([
            "--format",
            "json",
            "grade",
            "missing",
            "--reference",
            "reference",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    // Warnings are logged to stderr ahead of the envelope
    let stderr = String::from_utf8_lossy(&output.stderr);
    let json: serde_json::Value = serde_json::from_str(stderr.lines().last().unwrap()).unwrap();
    assert_eq!(json["error"]["type"], "source_not_found");
    assert_eq!(json["error"]["code"], 3);
}

#[test]
fn test_log_level_debug_shows_stage_transitions() {
    let dir = setup_project();
    gradeflow(dir.path())
        .args([
            "--log-level",
            "debug",
            "grade",
            "submission",
            "--reference",
            "reference",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("stage transition"));
}
