//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn adaptest() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("adaptest").unwrap()
}

/// Enough wrong answers to outlast any session against the sample banks.
fn wrong_answers() -> String {
    "no idea\n".repeat(30)
}

#[test]
fn validate_arithmetic_bank() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("12 items"))
        .stdout(predicate::str::contains("All item banks valid"));
}

#[test]
fn validate_directory() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg("../../item-banks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Arithmetic"))
        .stdout(predicate::str::contains("World Capitals"));
}

#[test]
fn validate_warns_on_small_bank() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tiny.toml");
    std::fs::write(
        &path,
        r#"
[bank]
id = "tiny"
name = "Tiny"

[[items]]
id = "only"
prompt = "2 + 2?"
answer = "4"
difficulty = 0.0
"#,
    )
    .unwrap();

    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING"))
        .stdout(predicate::str::contains("fewer than the 5 required"));
}

#[test]
fn validate_rejects_invalid_parameters() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[bank]
id = "bad"
name = "Bad"

[[items]]
id = "flat"
difficulty = 0.0
discrimination = -1.0
"#,
    )
    .unwrap();

    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("flat"));
}

#[test]
fn validate_nonexistent_file() {
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created adaptest.toml"))
        .stdout(predicate::str::contains("Created item-banks/example.toml"));

    assert!(dir.path().join("adaptest.toml").exists());
    assert!(dir.path().join("item-banks/example.toml").exists());

    // The generated files are usable as-is.
    adaptest()
        .current_dir(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg("item-banks/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All item banks valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    adaptest()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn score_maps_theta_to_band() {
    adaptest()
        .args(["score", "--theta", "1.5", "--confidence", "0.8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score:      72.5"))
        .stdout(predicate::str::contains("INTERMEDIATE"))
        .stdout(predicate::str::contains("Confidence: 80%"));
}

#[test]
fn score_clamps_low_theta() {
    adaptest()
        .args(["score", "--theta", "-4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Score:      0.0"))
        .stdout(predicate::str::contains("NEEDS_IMPROVEMENT"));
}

#[test]
fn score_rejects_confidence_out_of_range() {
    adaptest()
        .args(["score", "--theta", "0", "--confidence", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("confidence"));
}

#[test]
fn simulate_prints_recovery_table() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("sim.json");

    adaptest()
        .arg("simulate")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .arg("--thetas=-1,1")
        .args(["--replications", "5", "--seed", "3"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("RMSE"))
        .stdout(predicate::str::contains("-1.00"))
        .stdout(predicate::str::contains("+1.00"));

    let json = std::fs::read_to_string(&out).unwrap();
    assert!(json.contains("\"seed\": 3"));
    assert!(json.contains("\"runs\""));
}

#[test]
fn simulate_rejects_bad_thetas() {
    adaptest()
        .arg("simulate")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .arg("--thetas")
        .arg("low,high")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid theta"));
}

#[test]
fn take_stops_at_minimum_questions() {
    adaptest()
        .arg("take")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .write_stdin(wrong_answers())
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1:"))
        .stdout(predicate::str::contains("Questions:  5"))
        .stdout(predicate::str::contains("NEEDS_IMPROVEMENT"));
}

#[test]
fn take_honors_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("adaptest.toml");
    std::fs::write(&config, "[termination]\nmax_questions = 3\nmin_questions = 3\n").unwrap();

    adaptest()
        .arg("take")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .arg("--config")
        .arg(&config)
        .write_stdin(wrong_answers())
        .assert()
        .success()
        .stdout(predicate::str::contains("Questions:  3"))
        .stderr(predicate::str::contains("maximum questions reached"));
}

#[test]
fn take_stops_on_precision_once_minimum_is_met() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("adaptest.toml");
    std::fs::write(&config, "[termination]\nmax_questions = 3\nmin_questions = 2\n").unwrap();

    adaptest()
        .arg("take")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .arg("--config")
        .arg(&config)
        .write_stdin(wrong_answers())
        .assert()
        .success()
        .stdout(predicate::str::contains("Questions:  2"))
        .stderr(predicate::str::contains("target precision reached"));
}

#[test]
fn take_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("adaptest.toml");
    std::fs::write(&config, "[termination]\nmax_questions = 2\nmin_questions = 4\n").unwrap();

    adaptest()
        .arg("take")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .arg("--config")
        .arg(&config)
        .write_stdin(wrong_answers())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn take_fails_when_input_runs_out() {
    adaptest()
        .arg("take")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .write_stdin("7\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input closed"));
}

#[test]
fn take_writes_report_and_recalibrated_bank() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("session.json");
    let recalibrated = dir.path().join("out").join("arithmetic.toml");

    adaptest()
        .arg("take")
        .arg("--bank")
        .arg("../../item-banks/arithmetic.toml")
        .arg("--output")
        .arg(&report)
        .arg("--calibrate-out")
        .arg(&recalibrated)
        .write_stdin(wrong_answers())
        .assert()
        .success()
        .stderr(predicate::str::contains("Recalibrated 5 item(s)"));

    let json = std::fs::read_to_string(&report).unwrap();
    assert!(json.contains("\"turns\""));
    assert!(json.contains("\"stop_reason\""));

    // The rewritten bank still validates.
    adaptest()
        .arg("validate")
        .arg("--bank")
        .arg(&recalibrated)
        .assert()
        .success()
        .stdout(predicate::str::contains("12 items"));
}

#[test]
fn help_output() {
    adaptest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptive assessment engine"));
}

#[test]
fn version_output() {
    adaptest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("adaptest"));
}
