use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn validate_only_writes_no_log_or_charts() {
    let dir = tempdir().expect("temp dir");
    let config_path = dir.path().join("charts.yaml");
    let yaml = format!(
        r#"
run_id: "cli_check"
input:
  csv: "{csv}"
outputs:
  charts_dir: "{out}/consistency"
logging:
  enable_structured: true
"#,
        csv = dir.path().join("missing.csv").display(),
        out = dir.path().join("out").display(),
    );
    fs::write(&config_path, yaml).expect("write config");

    Command::cargo_bin("pace-charts")
        .expect("binary built")
        .arg("--config")
        .arg(&config_path)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "22 races in calendar (Bahrain Grand Prix .. Abu Dhabi Grand Prix)",
        ));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn unreadable_config_fails_with_path() {
    let dir = tempdir().expect("temp dir");
    let config_path = dir.path().join("absent.yaml");

    Command::cargo_bin("pace-charts")
        .expect("binary built")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yaml"));
}
