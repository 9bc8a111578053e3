//! Locate the wallet daemon, launch it when nothing listens on its socket,
//! and hand back a connected client.
//!
//! The flow is a small state machine recorded as [`LaunchPhase`]s:
//! probe once, and only if the socket is missing or refuses connections
//! start the daemon and probe again with exponential backoff until it
//! answers, exits, or the start timeout elapses.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep, timeout};
use tracing::{info, warn};

pub mod launcher;
pub mod locator;
pub mod state;

pub use launcher::{
  Backoff, DaemonSpawner, LaunchError, LaunchRequest, ProcessSpawner, SpawnedDaemon,
};
pub use state::{ConnectionState, LaunchPhase, PhaseLog, Session};

use crate::config::LauncherConfig;
use crate::network::Network;
use crate::resolve::RunContext;
use crate::rpc::{DaemonClient, DaemonError, GetInfoResult};

/// Set to `1` to never start the daemon from the interface.
pub const NO_AUTOSTART_ENV: &str = "COFFER_NO_AUTOSTART";

/// Everything the bootstrap needs to find or start one daemon.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
  pub socket: PathBuf,
  pub network: Network,
  /// Required to launch; without it an unreachable daemon is an error.
  pub daemon_config_path: Option<PathBuf>,
  pub command: Vec<String>,
  pub launcher: LauncherConfig,
  pub autostart: bool,
  /// Upper bound for a single RPC exchange
  pub request_timeout: Duration,
}

impl BootstrapOptions {
  pub fn from_run(ctx: &RunContext) -> Self {
    let autostart = std::env::var(NO_AUTOSTART_ENV).map_or(true, |v| v != "1");
    Self {
      socket: ctx.socket_path(),
      network: ctx.network,
      daemon_config_path: ctx.config.daemon_config_path.clone(),
      command: ctx.config.launch_command(),
      launcher: ctx.config.launcher,
      autostart,
      request_timeout: Duration::from_secs(30),
    }
  }

  fn launch_request(&self) -> Option<LaunchRequest> {
    if !self.autostart {
      return None;
    }
    self.daemon_config_path.as_ref().map(|p| LaunchRequest {
      command: self.command.clone(),
      config_path: p.clone(),
    })
  }
}

/// A live connection to the daemon.
#[derive(Debug)]
pub struct Connection {
  pub client: DaemonClient,
  pub info: GetInfoResult,
  pub launched: bool,
  pub phases: Vec<LaunchPhase>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
  /// Nothing answers on the socket and the daemon could not be launched.
  #[error("daemon not reachable at {}: {source}", socket.display())]
  Unreachable {
    socket: PathBuf,
    source: DaemonError,
    phases: Vec<LaunchPhase>,
  },
  /// The daemon is up but answered with an error.
  #[error("daemon at {} failed: {source}", socket.display())]
  Daemon {
    socket: PathBuf,
    source: DaemonError,
    phases: Vec<LaunchPhase>,
  },
  #[error("could not launch daemon: {source}")]
  Launch {
    socket: PathBuf,
    source: LaunchError,
    phases: Vec<LaunchPhase>,
  },
}

impl BootstrapError {
  pub fn phases(&self) -> &[LaunchPhase] {
    match self {
      BootstrapError::Unreachable { phases, .. }
      | BootstrapError::Daemon { phases, .. }
      | BootstrapError::Launch { phases, .. } => phases,
    }
  }

  pub fn socket(&self) -> &std::path::Path {
    match self {
      BootstrapError::Unreachable { socket, .. }
      | BootstrapError::Daemon { socket, .. }
      | BootstrapError::Launch { socket, .. } => socket,
    }
  }
}

/// Runs the locate/launch state machine once.
pub struct Bootstrap<S = ProcessSpawner> {
  opts: BootstrapOptions,
  spawner: S,
}

impl Bootstrap<ProcessSpawner> {
  pub fn new(opts: BootstrapOptions) -> Self {
    Self {
      opts,
      spawner: ProcessSpawner,
    }
  }
}

impl<S: DaemonSpawner> Bootstrap<S> {
  pub fn with_spawner(opts: BootstrapOptions, spawner: S) -> Self {
    Self { opts, spawner }
  }

  pub fn spawner(&self) -> &S {
    &self.spawner
  }

  pub async fn connect(&self) -> Result<Connection, BootstrapError> {
    let client = DaemonClient::new(&self.opts.socket).with_timeout(self.opts.request_timeout);
    let mut phases = PhaseLog::default();

    phases.advance(LaunchPhase::Attempting { attempt: 1 });
    let first_err = match locator::probe(&client).await {
      Ok(info) => {
        phases.advance(LaunchPhase::Reachable);
        return Ok(self.connected(client, info, phases));
      }
      Err(e) if !e.is_unreachable() => {
        phases.advance(LaunchPhase::Failed {
          reason: e.to_string(),
        });
        return Err(self.daemon_error(e, phases));
      }
      Err(e) => e,
    };
    phases.advance(LaunchPhase::Unreachable {
      reason: first_err.to_string(),
    });

    let Some(req) = self.opts.launch_request() else {
      let reason = if self.opts.autostart {
        "no daemon config to launch from"
      } else {
        "autostart disabled"
      };
      phases.advance(LaunchPhase::Failed {
        reason: reason.to_string(),
      });
      return Err(BootstrapError::Unreachable {
        socket: self.opts.socket.clone(),
        source: first_err,
        phases: phases.into_vec(),
      });
    };

    phases.advance(LaunchPhase::Launching);
    info!(event = "daemon_launch", socket = %self.opts.socket.display(), argv = ?req.argv(), "starting daemon");
    let mut spawned = match self.spawner.spawn(&req) {
      Ok(s) => s,
      Err(e) => {
        phases.advance(LaunchPhase::Failed {
          reason: e.to_string(),
        });
        return Err(self.launch_error(e, phases));
      }
    };

    let limit = Duration::from_secs(self.opts.launcher.start_timeout_secs);
    // No deadline when the configured timeout does not fit in an Instant.
    let deadline = Instant::now().checked_add(limit);
    let mut backoff = Backoff::from_config(&self.opts.launcher);
    let mut attempt = 2;
    loop {
      phases.advance(LaunchPhase::Attempting { attempt });
      let probe = locator::probe(&client);
      let outcome = match deadline {
        Some(d) => timeout(d.saturating_duration_since(Instant::now()), probe)
          .await
          .unwrap_or_else(|_| Err(DaemonError::NoAnswer(format!("no answer within {limit:?}")))),
        None => probe.await,
      };
      let last = match outcome {
        Ok(info) => {
          phases.advance(LaunchPhase::Reachable);
          info!(event = "daemon_launched", pid = ?spawned.pid(), attempt, "launched daemon is reachable");
          return Ok(self.connected(client, info, phases));
        }
        // Still starting: nothing listening yet, or bound but not answering.
        Err(e @ (DaemonError::Transport { .. } | DaemonError::NoAnswer(_))) => e,
        Err(e) => {
          phases.advance(LaunchPhase::Failed {
            reason: e.to_string(),
          });
          return Err(self.daemon_error(e, phases));
        }
      };

      if let Some(status) = spawned.failed_exit() {
        let err = LaunchError::Exited {
          status: status.to_string(),
        };
        phases.advance(LaunchPhase::Failed {
          reason: err.to_string(),
        });
        return Err(self.launch_error(err, phases));
      }

      let mut delay = backoff.next().unwrap_or(Duration::from_millis(50));
      if let Some(d) = deadline {
        let left = d.saturating_duration_since(Instant::now());
        if left.is_zero() {
          let err = LaunchError::Timeout { after: limit, last };
          phases.advance(LaunchPhase::Failed {
            reason: err.to_string(),
          });
          return Err(self.launch_error(err, phases));
        }
        delay = delay.min(left);
      }
      sleep(delay).await;
      attempt += 1;
    }
  }

  fn connected(&self, client: DaemonClient, info: GetInfoResult, phases: PhaseLog) -> Connection {
    if info.network != self.opts.network {
      warn!(
        event = "daemon_network_mismatch",
        expected = %self.opts.network,
        actual = %info.network,
        "daemon runs on a different network than configured"
      );
    }
    Connection {
      client,
      info,
      launched: phases.launched(),
      phases: phases.into_vec(),
    }
  }

  fn daemon_error(&self, source: DaemonError, phases: PhaseLog) -> BootstrapError {
    BootstrapError::Daemon {
      socket: self.opts.socket.clone(),
      source,
      phases: phases.into_vec(),
    }
  }

  fn launch_error(&self, source: LaunchError, phases: PhaseLog) -> BootstrapError {
    BootstrapError::Launch {
      socket: self.opts.socket.clone(),
      source,
      phases: phases.into_vec(),
    }
  }
}

/// Poll `getinfo` until the daemon reports a fully synced chain.
pub async fn wait_synced<F>(
  client: &DaemonClient,
  interval: Duration,
  mut on_progress: F,
) -> Result<GetInfoResult, DaemonError>
where
  F: FnMut(&GetInfoResult),
{
  loop {
    let info = client.get_info().await?;
    on_progress(&info);
    if info.is_synced() {
      return Ok(info);
    }
    sleep(interval).await;
  }
}
