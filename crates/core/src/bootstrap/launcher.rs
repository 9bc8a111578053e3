use std::io;
use std::os::unix::process::CommandExt as _;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::LauncherConfig;
use crate::rpc::DaemonError;

/// What to run when the daemon has to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
  /// argv prefix, e.g. `["cofferd"]`
  pub command: Vec<String>,
  pub config_path: PathBuf,
}

impl LaunchRequest {
  /// Full argv: the command followed by `--conf <config_path>`.
  pub fn argv(&self) -> Vec<String> {
    let mut argv = self.command.clone();
    argv.push("--conf".to_string());
    argv.push(self.config_path.display().to_string());
    argv
  }
}

#[derive(Debug, Error)]
pub enum LaunchError {
  #[error("daemon launch command is empty")]
  EmptyCommand,
  #[error("failed to start `{program}`: {source}")]
  Spawn { program: String, source: io::Error },
  #[error("daemon exited during startup ({status})")]
  Exited { status: String },
  #[error("daemon did not become reachable within {after:?}: {last}")]
  Timeout { after: Duration, last: DaemonError },
}

/// A daemon that was started for this session.
///
/// The process is never joined or killed here: dropping the handle leaves
/// the daemon running on its own.
#[derive(Debug)]
pub struct SpawnedDaemon {
  child: Option<Child>,
}

impl SpawnedDaemon {
  pub fn from_child(child: Child) -> Self {
    Self { child: Some(child) }
  }

  /// A daemon started by other means, with no process to watch.
  pub fn detached() -> Self {
    Self { child: None }
  }

  pub fn pid(&self) -> Option<u32> {
    self.child.as_ref().map(Child::id)
  }

  /// Exit status if the process already terminated unsuccessfully. A clean
  /// exit is treated as the daemon having forked into the background.
  pub fn failed_exit(&mut self) -> Option<ExitStatus> {
    let child = self.child.as_mut()?;
    match child.try_wait() {
      Ok(Some(status)) if !status.success() => Some(status),
      Ok(Some(_)) => {
        self.child = None;
        None
      }
      Ok(None) => None,
      Err(e) => {
        warn!(event = "daemon_wait_error", error = %e, "could not poll launched daemon");
        None
      }
    }
  }
}

/// Seam for starting the daemon so the bootstrap can be exercised without
/// real processes.
pub trait DaemonSpawner {
  fn spawn(&self, req: &LaunchRequest) -> Result<SpawnedDaemon, LaunchError>;
}

/// Starts the daemon as a detached child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl DaemonSpawner for ProcessSpawner {
  fn spawn(&self, req: &LaunchRequest) -> Result<SpawnedDaemon, LaunchError> {
    if req.command.is_empty() {
      return Err(LaunchError::EmptyCommand);
    }
    let argv = req.argv();
    let (program, args) = argv.split_first().ok_or(LaunchError::EmptyCommand)?;
    let mut cmd = Command::new(program);
    cmd
      .args(args)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .process_group(0);
    let child = cmd.spawn().map_err(|source| LaunchError::Spawn {
      program: program.clone(),
      source,
    })?;
    info!(event = "daemon_spawned", pid = child.id(), argv = ?argv, "daemon process started");
    Ok(SpawnedDaemon::from_child(child))
  }
}

/// Exponential delay: starts at `initial`, doubles, never exceeds `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
  next: Duration,
  max: Duration,
}

impl Backoff {
  pub fn new(initial: Duration, max: Duration) -> Self {
    Self {
      next: initial.min(max),
      max,
    }
  }

  pub fn from_config(cfg: &LauncherConfig) -> Self {
    Self::new(
      Duration::from_millis(cfg.initial_backoff_ms.max(1)),
      Duration::from_millis(cfg.max_backoff_ms.max(1)),
    )
  }
}

impl Iterator for Backoff {
  type Item = Duration;

  fn next(&mut self) -> Option<Duration> {
    let current = self.next;
    self.next = (current * 2).min(self.max);
    Some(current)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn argv_appends_conf() {
    let req = LaunchRequest {
      command: vec!["cofferd".into(), "--verbose".into()],
      config_path: PathBuf::from("/d/daemon.toml"),
    };
    assert_eq!(req.argv(), vec!["cofferd", "--verbose", "--conf", "/d/daemon.toml"]);
  }

  #[test]
  fn backoff_doubles_then_caps() {
    let steps: Vec<u64> = Backoff::new(Duration::from_millis(50), Duration::from_secs(1))
      .take(7)
      .map(|d| d.as_millis() as u64)
      .collect();
    assert_eq!(steps, vec![50, 100, 200, 400, 800, 1000, 1000]);
  }

  #[test]
  fn missing_program_is_a_spawn_error() {
    let req = LaunchRequest {
      command: vec!["/nonexistent/cofferd-binary".into()],
      config_path: PathBuf::from("/tmp/daemon.toml"),
    };
    let err = ProcessSpawner.spawn(&req).unwrap_err();
    assert!(matches!(err, LaunchError::Spawn { .. }), "{err}");
  }

  #[test]
  fn empty_command_is_rejected() {
    let req = LaunchRequest {
      command: vec![],
      config_path: PathBuf::from("/tmp/daemon.toml"),
    };
    assert!(matches!(
      ProcessSpawner.spawn(&req),
      Err(LaunchError::EmptyCommand)
    ));
  }

  #[test]
  fn failing_child_reports_its_exit() {
    let req = LaunchRequest {
      command: vec!["sh".into(), "-c".into(), "exit 3".into(), "sh".into()],
      config_path: PathBuf::from("/tmp/daemon.toml"),
    };
    let mut spawned = ProcessSpawner.spawn(&req).unwrap();
    let mut status = None;
    for _ in 0..100 {
      status = spawned.failed_exit();
      if status.is_some() {
        break;
      }
      std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(status.and_then(|s| s.code()), Some(3));
  }

  proptest! {
    #[test]
    fn backoff_never_exceeds_max(initial in 1u64..5000, max in 1u64..5000) {
      let mut b = Backoff::new(Duration::from_millis(initial), Duration::from_millis(max));
      for _ in 0..20 {
        prop_assert!(b.next().unwrap() <= Duration::from_millis(max));
      }
    }
  }
}
