use std::io::{self, IsTerminal as _};

use coffer_core::bootstrap::{BootstrapError, LaunchError};
use coffer_core::installer::InstallError;
use coffer_core::resolve::ResolveError;
use coffer_core::rpc::DaemonError;
use thiserror::Error;
use yansi::Paint as _;

/// Everything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),
  #[error(transparent)]
  Install(#[from] InstallError),
  #[error(transparent)]
  Bootstrap(#[from] BootstrapError),
  #[error(transparent)]
  Daemon(#[from] DaemonError),
  #[error("{0}")]
  Usage(String),
  #[error("setup aborted: {0}")]
  Setup(anyhow::Error),
  #[error("invalid params: {0}")]
  Params(#[from] serde_json::Error),
  #[error("io: {0}")]
  Io(#[from] io::Error),
}

/// One actionable line describing why `action` failed.
pub fn render_failure(action: &str, err: &CliError) -> String {
  match err {
    CliError::Bootstrap(BootstrapError::Unreachable { socket, .. }) => format!(
      "{} failed: daemon not reachable at {}.",
      action,
      socket.display()
    ),
    CliError::Bootstrap(BootstrapError::Launch {
      socket,
      source: source @ LaunchError::Spawn { .. },
      ..
    }) => format!(
      "{} failed: daemon not reachable at {} and could not be started ({}). Set daemon_command in gui.toml.",
      action,
      socket.display(),
      source
    ),
    CliError::Bootstrap(BootstrapError::Launch { socket, source, .. }) => format!(
      "{} failed: daemon not reachable at {} ({}).",
      action,
      socket.display(),
      source
    ),
    CliError::Daemon(e) if e.is_unreachable() => {
      format!("{action} failed: daemon stopped responding ({e}).")
    }
    _ => format!("{action} failed: {err}"),
  }
}

/// Print the failure to stderr, red when stderr is a terminal.
pub fn report(action: &str, err: &CliError) {
  let line = render_failure(action, err);
  if io::stderr().is_terminal() {
    eprintln!("{} {}", "error:".red().bold(), line);
  } else {
    eprintln!("error: {line}");
  }
}
