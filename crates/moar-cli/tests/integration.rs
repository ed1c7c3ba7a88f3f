//! Integration tests for moar-cli.
//!
//! Run the built `moar` binary against the bundled scenarios and temporary
//! EEPROM images.

use std::path::PathBuf;
use std::process::{Command, Output};

fn moar_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_moar"))
}

fn scenario(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// `moar simulate`
// ---------------------------------------------------------------------------

#[test]
fn simulate_select_and_sweep() {
    let output = moar_bin()
        .arg("simulate")
        .arg(scenario("select_and_sweep.toml"))
        .output()
        .expect("failed to run moar simulate");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let out = stdout(&output);
    assert!(out.contains("Scenario: select and sweep"));
    assert!(out.contains("STATUS MOAR"));
    assert!(out.contains("STATUS POT 4"));
    assert!(out.contains("Halted:          no"));
}

#[test]
fn simulate_envelope_follow_modulates() {
    let output = moar_bin()
        .arg("simulate")
        .arg(scenario("envelope_follow.toml"))
        .output()
        .expect("failed to run moar simulate");
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("STATUS ENV 1"));
    assert!(out.contains("STATUS EF ON"));
    assert!(out.contains("CC   3 =  50  ch 1"), "{out}");
    assert!(out.contains("Follow mode:     on"));
}

#[test]
fn simulate_quiet_prints_summary_only() {
    let output = moar_bin()
        .args(["simulate", "--quiet"])
        .arg(scenario("select_and_sweep.toml"))
        .output()
        .expect("failed to run moar simulate");
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(!out.contains("STATUS"));
    assert!(out.contains("Control changes:"));
}

#[test]
fn simulate_missing_scenario_fails() {
    let output = moar_bin()
        .args(["simulate", "does-not-exist.toml"])
        .output()
        .expect("failed to run moar simulate");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does-not-exist.toml"));
}

#[test]
fn simulate_rejects_bad_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        "duration_ms = 10\n[[events]]\nkind = \"control\"\nat = 0\nindex = 12\nhold = 50\n",
    )
    .unwrap();

    let output = moar_bin().arg("simulate").arg(&path).output().unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `moar image`
// ---------------------------------------------------------------------------

#[test]
fn image_init_then_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");

    let output = moar_bin().args(["image", "init"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    assert!(path.exists());

    let output = moar_bin()
        .args(["image", "inspect", "--channels"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("primary region"));
    assert!(out.contains("backup region"));
    assert!(!out.contains("UNHEALTHY"));
    assert!(out.contains("mode:        SEF"), "{out}");
}

#[test]
fn image_init_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    std::fs::write(&path, b"keep").unwrap();

    let output = moar_bin().args(["image", "init"]).arg(&path).output().unwrap();
    assert!(!output.status.success());
    assert_eq!(std::fs::read(&path).unwrap(), b"keep");

    let output = moar_bin()
        .args(["image", "init", "--force"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn corrupt_primary_then_boot_from_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");
    assert!(moar_bin().args(["image", "init"]).arg(&path).status().unwrap().success());
    assert!(moar_bin().args(["image", "corrupt"]).arg(&path).status().unwrap().success());

    let output = moar_bin().args(["image", "inspect"]).arg(&path).output().unwrap();
    let out = stdout(&output);
    assert!(out.contains("UNHEALTHY"));

    // Booting rewrites nothing until a save, but the controller still runs.
    let output = moar_bin()
        .args(["simulate", "--quiet", "--image"])
        .arg(&path)
        .arg(scenario("select_and_sweep.toml"))
        .output()
        .unwrap();
    assert!(output.status.success());
}

#[test]
fn saved_mapping_lands_in_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eeprom.bin");

    let output = moar_bin()
        .args(["simulate", "--image"])
        .arg(&path)
        .arg(scenario("save_chord.toml"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("STATUS SAVED"));
    assert!(out.contains("STATUS REBOOTING"));
    assert!(out.contains("Halted:          yes"));

    let output = moar_bin()
        .args(["image", "inspect", "--channels"])
        .arg(&path)
        .output()
        .unwrap();
    let out = stdout(&output);
    assert!(out.contains("     7     1    7  -"), "{out}");
}
