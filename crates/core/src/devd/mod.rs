//! A small wallet daemon speaking the same line-delimited JSON-RPC as the
//! real one. Used for local development (`coffer devd`) and in tests.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

mod api;
mod server;

use crate::config::{ConfigError, DaemonConfig, default_datadir, default_socket_path};
use crate::network::Network;

pub use api::Wallet;

#[derive(Debug, Clone, PartialEq)]
pub struct DevdOptions {
  pub socket: PathBuf,
  pub network: Network,
  /// Number of `getinfo` calls until the chain reports synced (0 = synced)
  pub sync_steps: u32,
}

impl DevdOptions {
  /// Derive options from a daemon config the way the real daemon would:
  /// the socket lives at `<data_dir>/<network>/cofferd_rpc`.
  pub fn from_daemon_config(path: &Path) -> Result<Self, ConfigError> {
    let cfg = DaemonConfig::from_file(path)?;
    let network = cfg.network().unwrap_or_default();
    let data_dir = cfg
      .data_dir
      .clone()
      .or_else(default_datadir)
      .or_else(|| path.parent().map(Path::to_path_buf))
      .unwrap_or_else(|| PathBuf::from("."));
    Ok(Self {
      socket: default_socket_path(&data_dir, network),
      network,
      sync_steps: 0,
    })
  }
}

/// Handle to the running dev daemon.
pub struct DevdHandle {
  task: JoinHandle<()>,
  socket_path: PathBuf,
  shutdown: watch::Sender<bool>,
}

impl DevdHandle {
  /// Signal shutdown and wait for the accept loop to remove its socket.
  pub async fn stop(self) {
    let _ = self.shutdown.send(true);
    let _ = self.task.await;
  }

  /// Await the server task to finish (e.g., after a `stop` request).
  pub async fn wait(self) {
    let _ = self.task.await;
  }

  pub fn socket_path(&self) -> &Path {
    &self.socket_path
  }
}

/// Start serving on `opts.socket`.
pub async fn start(opts: DevdOptions) -> io::Result<DevdHandle> {
  let wallet = Arc::new(Wallet::new(opts.network, opts.sync_steps));
  let (shutdown_tx, shutdown_rx) = server::shutdown_channel();
  let task = server::start(&opts.socket, wallet, shutdown_tx.clone(), shutdown_rx)?;
  Ok(DevdHandle {
    task,
    socket_path: opts.socket,
    shutdown: shutdown_tx,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn options_follow_daemon_config() {
    let td = tempfile::tempdir().unwrap();
    let conf = td.path().join("daemon.toml");
    DaemonConfig::template(td.path(), Network::Regtest)
      .write_to(&conf)
      .unwrap();
    let opts = DevdOptions::from_daemon_config(&conf).unwrap();
    assert_eq!(opts.network, Network::Regtest);
    assert_eq!(opts.socket, td.path().join("regtest").join("cofferd_rpc"));
  }
}
