//! Integration tests for the mfsim CLI.
//!
//! These tests run the binary against simulation workspaces built with
//! assert_fs and check its output with predicates.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MFSIM_NAM: &str = "\
BEGIN options
END options
BEGIN timing
  TDIS6  sim.tdis
END timing
BEGIN models
  gwf6  flow.nam  flow
END models
BEGIN exchanges
END exchanges
BEGIN solutiongroup 1
  IMS6  sim.ims  flow
END solutiongroup
";

const FLOW_NAM: &str = "\
BEGIN options
  LIST  flow.lst
END options
BEGIN packages
  DIS6  flow.dis
  IC6  flow.ic
  NPF6  flow.npf
  WEL6  flow.wel
END packages
";

/// Build a valid one-model workspace.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("mfsim.nam").write_str(MFSIM_NAM).unwrap();
    temp.child("sim.tdis")
        .write_str("BEGIN dimensions\n  NPER 1\nEND dimensions\nBEGIN perioddata\n  1.0 1 1.0\nEND perioddata\n")
        .unwrap();
    temp.child("sim.ims").write_str("BEGIN options\nEND options\n").unwrap();
    temp.child("flow.nam").write_str(FLOW_NAM).unwrap();
    temp.child("flow.dis")
        .write_str("BEGIN dimensions\n  NLAY 1\nEND dimensions\nBEGIN griddata\n  top\n    CONSTANT 1.0\nEND griddata\n")
        .unwrap();
    for name in ["flow.ic", "flow.npf"] {
        temp.child(name)
            .write_str("BEGIN griddata\n  strt\n    CONSTANT 1.0\nEND griddata\n")
            .unwrap();
    }
    temp.child("flow.wel")
        .write_str("BEGIN options\n  OBS6 FILEIN flow.wel.obs\nEND options\nBEGIN dimensions\n  MAXBOUND 1\nEND dimensions\n")
        .unwrap();
    temp.child("flow.wel.obs")
        .write_str("BEGIN continuous FILEOUT flow.wel.csv\n  q wel 1 1 1\nEND continuous\n")
        .unwrap();
    temp
}

/// Get a command for running mfsim, isolated from user configuration.
fn mfsim(ws: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mfsim").unwrap();
    cmd.arg("--cwd")
        .arg(ws.path())
        .env("HOME", ws.path().join(".home"))
        .env("XDG_CONFIG_HOME", ws.path().join(".xdg"))
        .env_remove("MFSIM_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("mfsim")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mfsim"));
}

#[test]
fn list_shows_packages_and_children() {
    let ws = workspace();
    mfsim(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("flow [gwf6]"))
        .stdout(predicate::str::contains("flow/dis"))
        .stdout(predicate::str::contains("flow/wel/obs"));
}

#[test]
fn list_json_is_machine_readable() {
    let ws = workspace();
    let output = mfsim(&ws).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let model = &listing["models"][0];
    assert_eq!(model["name"], "flow");
    assert_eq!(model["packages"][0]["package_type"], "dis");
    assert_eq!(listing["packages"].as_array().unwrap().len(), 2);
}

#[test]
fn check_passes_on_valid_simulation() {
    let ws = workspace();
    mfsim(&ws)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn check_fails_on_missing_required_package() {
    let ws = workspace();
    ws.child("flow.nam")
        .write_str(&FLOW_NAM.replace("  NPF6  flow.npf\n", ""))
        .unwrap();
    mfsim(&ws)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'npf' is missing"));
}

#[test]
fn missing_workspace_reports_the_path() {
    let ws = TempDir::new().unwrap();
    mfsim(&ws)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load simulation"));
}

#[test]
fn relocate_moves_model_files() {
    let ws = workspace();
    let out = TempDir::new().unwrap();
    mfsim(&ws)
        .args(["relocate", "flow", "models/flow", "--output"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("models/flow"));

    out.child("mfsim.nam")
        .assert(predicate::str::contains("models/flow/flow.nam"));
    out.child("models/flow/flow.dis").assert(predicate::path::exists());
    out.child("models/flow/flow.wel.obs").assert(predicate::path::exists());
    out.child("models/flow/flow.wel")
        .assert(predicate::str::contains("FILEIN models/flow/flow.wel.obs"));
    out.child("sim.tdis").assert(predicate::path::exists());
}

#[test]
fn relocate_copies_external_array_files() {
    let ws = workspace();
    ws.child("flow.npf")
        .write_str("BEGIN griddata\n  k\n    OPEN/CLOSE arrays/k.dat\nEND griddata\n")
        .unwrap();
    ws.child("arrays/k.dat").write_str("1.0 1.0\n").unwrap();
    let out = TempDir::new().unwrap();
    mfsim(&ws)
        .args(["relocate", "flow", "models/flow", "--output"])
        .arg(out.path())
        .assert()
        .success();

    out.child("models/flow/flow.npf")
        .assert(predicate::str::contains("OPEN/CLOSE models/flow/arrays/k.dat"));
    out.child("models/flow/arrays/k.dat")
        .assert(predicate::str::diff("1.0 1.0\n"));
}

#[test]
fn relocate_unknown_model_fails() {
    let ws = workspace();
    mfsim(&ws)
        .args(["relocate", "nope", "sub"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn rewrite_round_trips() {
    let ws = workspace();
    let out = TempDir::new().unwrap();
    mfsim(&ws)
        .arg("rewrite")
        .arg("--output")
        .arg(out.path())
        .assert()
        .success();

    out.child("flow.nam").assert(predicate::str::contains("flow.wel"));
    Command::cargo_bin("mfsim")
        .unwrap()
        .arg("--cwd")
        .arg(out.path())
        .env("HOME", out.path().join(".home"))
        .env_remove("MFSIM_CONFIG")
        .arg("check")
        .assert()
        .success();
}

#[test]
fn schema_lists_model_packages() {
    let ws = workspace();
    mfsim(&ws)
        .args(["schema", "gwf6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rcha"))
        .stdout(predicate::str::contains("required"));
}

#[test]
fn config_set_then_get() {
    let ws = workspace();
    mfsim(&ws)
        .args(["config", "set", "strict", "true"])
        .assert()
        .success();
    ws.child(".mfsim/config.toml")
        .assert(predicate::str::contains("strict = true"));

    mfsim(&ws)
        .args(["config", "get", "strict"])
        .assert()
        .success()
        .stdout(predicate::str::diff("true\n"));
}

#[test]
fn config_rejects_unknown_key() {
    let ws = workspace();
    mfsim(&ws)
        .args(["config", "set", "trunk", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("mfsim")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mfsim"));
}

#[test]
fn init_writes_a_skeleton() {
    let ws = TempDir::new().unwrap();
    mfsim(&ws).args(["init", "flow"]).assert().success();

    ws.child("mfsim.nam")
        .assert(predicate::str::contains("gwf6  flow.nam  flow"))
        .assert(predicate::str::contains("TDIS6  sim.tdis"));
    ws.child("flow.nam")
        .assert(predicate::str::contains("DIS6"))
        .assert(predicate::str::contains("NPF6"));
    ws.child("flow.ic").assert(predicate::path::exists());

    mfsim(&ws)
        .args(["init", "flow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn init_uses_configured_model_type() {
    let ws = TempDir::new().unwrap();
    ws.child(".mfsim/config.toml")
        .write_str("default_model_type = \"gwt6\"\n")
        .unwrap();
    mfsim(&ws).args(["init", "trans"]).assert().success();

    ws.child("mfsim.nam")
        .assert(predicate::str::contains("gwt6  trans.nam  trans"));
}
