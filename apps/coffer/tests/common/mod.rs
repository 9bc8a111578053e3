#![allow(dead_code)]
use std::path::Path;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use test_support::TempDatadir;

/// `coffer` with an isolated environment rooted at `dd`.
pub fn coffer(dd: &TempDatadir) -> Command {
  let mut cmd = Command::cargo_bin("coffer").expect("compile bin");
  cmd
    .env("COFFER_DATADIR", dd.path())
    .env("NO_COLOR", "1")
    .env_remove("LOG_LEVEL")
    .env_remove("COFFER_NO_AUTOSTART");
  cmd
}

pub fn coffer_bin() -> String {
  assert_cmd::cargo::cargo_bin("coffer").display().to_string()
}

/// Wait until `path` disappears, e.g. a socket after shutdown.
pub fn wait_gone(path: &Path, timeout: Duration) -> bool {
  let start = Instant::now();
  while path.exists() {
    if start.elapsed() > timeout {
      return false;
    }
    std::thread::sleep(Duration::from_millis(20));
  }
  true
}
