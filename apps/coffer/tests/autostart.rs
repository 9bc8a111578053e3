mod common;

use std::time::Duration;

use predicates::prelude::*;
use test_support::TempDatadir;

#[test]
fn connect_launches_the_daemon_then_reuses_it() {
  let dd = TempDatadir::new();
  let bin = common::coffer_bin();
  dd.write_launchable_config("regtest", &[&bin, "devd"]);
  let sock = dd.socket_path("regtest");

  common::coffer(&dd)
    .args(["--regtest", "connect"])
    .assert()
    .success()
    .stdout(predicate::str::contains("daemon: started"))
    .stdout(predicate::str::contains("daemon: connected"));
  assert!(sock.exists());

  // Second run finds the daemon already listening.
  common::coffer(&dd)
    .args(["--regtest"])
    .assert()
    .success()
    .stdout(predicate::str::contains("daemon: started").not())
    .stdout(predicate::str::contains("regtest"));

  common::coffer(&dd)
    .args(["--regtest", "address"])
    .assert()
    .success()
    .stdout(predicate::str::starts_with("bcrt1q"));

  common::coffer(&dd)
    .args(["--regtest", "call", "listcoins", "{}"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"coins\""));

  common::coffer(&dd)
    .args(["--regtest", "stop"])
    .assert()
    .success()
    .stdout(predicate::str::contains("daemon: stopped"));
  assert!(common::wait_gone(&sock, Duration::from_secs(5)));
}

#[test]
fn unknown_rpc_method_surfaces_the_daemon_error() {
  let dd = TempDatadir::new();
  let bin = common::coffer_bin();
  dd.write_launchable_config("signet", &[&bin, "devd"]);

  common::coffer(&dd)
    .args(["--signet", "call", "createspend"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("call failed: daemon error -32601"));

  common::coffer(&dd)
    .args(["--signet", "stop"])
    .assert()
    .success();
}

#[test]
fn autostart_can_be_turned_off() {
  let dd = TempDatadir::new();
  let bin = common::coffer_bin();
  dd.write_launchable_config("regtest", &[&bin, "devd"]);

  common::coffer(&dd)
    .env("COFFER_NO_AUTOSTART", "1")
    .args(["--regtest", "info"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("daemon not reachable"));
  assert!(!dd.socket_path("regtest").exists());
}
