use assert_cmd::prelude::*;
use std::process::Command;

#[test]
fn help_exits_successfully() {
  let mut cmd = Command::cargo_bin("coffer").expect("compile bin");
  let assert = cmd.arg("--help").assert();
  assert.success();
}

#[test]
fn conf_and_datadir_are_rejected_together() {
  let mut cmd = Command::cargo_bin("coffer").expect("compile bin");
  cmd
    .args(["--conf", "/tmp/gui.toml", "--datadir", "/tmp"])
    .assert()
    .failure()
    .code(2);
}
