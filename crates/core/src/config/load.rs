use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::paths::default_socket_path;
use super::types::{ConfigError, DaemonConfig, GuiConfig, LogLevel, Result};
use crate::network::Network;

const GUI_KEYS: [&str; 6] = [
  "daemon_config_path",
  "daemon_rpc_path",
  "log_level",
  "debug",
  "daemon_command",
  "launcher",
];

/// Environment variable that overrides the configured log level.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

fn read(path: &Path) -> Result<String> {
  fs::read_to_string(path).map_err(|source| match source.kind() {
    io::ErrorKind::NotFound => ConfigError::NotFound {
      path: path.to_path_buf(),
    },
    _ => ConfigError::Io {
      path: path.to_path_buf(),
      source,
    },
  })
}

impl GuiConfig {
  /// Load and check an interface config.
  ///
  /// A file setting neither daemon path is reported as
  /// [`ConfigError::MissingFields`] so callers can route to setup.
  pub fn from_file(path: &Path) -> Result<GuiConfig> {
    let s = read(path)?;
    let table: toml::Table = toml::from_str(&s).map_err(|source| ConfigError::Toml {
      path: path.to_path_buf(),
      source,
    })?;
    for key in table.keys().filter(|k| !GUI_KEYS.contains(&k.as_str())) {
      warn!(event = "config_unknown_key", key = %key, path = %path.display(), "ignoring unknown config key");
    }
    let cfg: GuiConfig = toml::from_str(&s).map_err(|source| ConfigError::Toml {
      path: path.to_path_buf(),
      source,
    })?;
    if cfg.daemon_config_path.is_none() && cfg.daemon_rpc_path.is_none() {
      return Err(ConfigError::MissingFields {
        path: path.to_path_buf(),
      });
    }
    Ok(cfg)
  }

  /// Socket to dial: the explicit `daemon_rpc_path`, else derived from the
  /// daemon's `data_dir`, else from `datadir`.
  pub fn rpc_socket_path(
    &self,
    datadir: &Path,
    network: Network,
    daemon: Option<&DaemonConfig>,
  ) -> PathBuf {
    if let Some(p) = &self.daemon_rpc_path {
      return p.clone();
    }
    let base = daemon
      .and_then(|d| d.data_dir.as_deref())
      .unwrap_or(datadir);
    default_socket_path(base, network)
  }

  /// `LOG_LEVEL` wins over the file, `info` otherwise.
  pub fn effective_log_level(&self, env_level: Option<&str>) -> LogLevel {
    env_level
      .and_then(LogLevel::parse)
      .or(self.log_level)
      .unwrap_or_default()
  }

  pub fn launch_command(&self) -> Vec<String> {
    match &self.daemon_command {
      Some(argv) if !argv.is_empty() => argv.clone(),
      _ => vec!["cofferd".to_string()],
    }
  }
}

impl DaemonConfig {
  pub fn from_file(path: &Path) -> Result<DaemonConfig> {
    let s = read(path)?;
    toml::from_str(&s).map_err(|source| ConfigError::Toml {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn network(&self) -> Option<Network> {
    self.bitcoin_config.as_ref().map(|b| b.network)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::types::BitcoinConfig;
  use pretty_assertions::assert_eq;
  use std::fs;

  #[test]
  fn missing_file_is_not_found() {
    let td = tempfile::tempdir().unwrap();
    let err = GuiConfig::from_file(&td.path().join("gui.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "{err}");
    assert!(err.wants_installer());
  }

  #[test]
  fn file_without_daemon_paths_is_missing_fields() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("gui.toml");
    fs::write(&p, "log_level = \"debug\"\n").unwrap();
    let err = GuiConfig::from_file(&p).unwrap_err();
    assert!(matches!(err, ConfigError::MissingFields { .. }), "{err}");
  }

  #[test]
  fn broken_toml_is_a_hard_error() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("gui.toml");
    fs::write(&p, "daemon_rpc_path = [").unwrap();
    let err = GuiConfig::from_file(&p).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
    assert!(!err.wants_installer());
  }

  #[test]
  fn loads_full_config_and_tolerates_unknown_keys() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("gui.toml");
    fs::write(
      &p,
      r#"
daemon_config_path = "/etc/cofferd.toml"
log_level = "warn"
daemon_command = ["cofferd", "--verbose"]
window_scale = 2

[launcher]
start_timeout_secs = 3
"#,
    )
    .unwrap();
    let cfg = GuiConfig::from_file(&p).unwrap();
    assert_eq!(
      cfg.daemon_config_path,
      Some(PathBuf::from("/etc/cofferd.toml"))
    );
    assert_eq!(cfg.log_level, Some(LogLevel::Warn));
    assert_eq!(cfg.launcher.start_timeout_secs, 3);
    assert_eq!(cfg.launcher.initial_backoff_ms, 50);
    assert_eq!(cfg.launch_command(), vec!["cofferd", "--verbose"]);
  }

  #[test]
  fn socket_path_precedence() {
    let datadir = Path::new("/d");
    let daemon = DaemonConfig {
      data_dir: Some(PathBuf::from("/daemon")),
      log_level: None,
      bitcoin_config: Some(BitcoinConfig {
        network: Network::Signet,
        poll_interval_secs: None,
      }),
    };
    let mut cfg = GuiConfig::default();
    assert_eq!(
      cfg.rpc_socket_path(datadir, Network::Signet, None),
      PathBuf::from("/d/signet/cofferd_rpc")
    );
    assert_eq!(
      cfg.rpc_socket_path(datadir, Network::Signet, Some(&daemon)),
      PathBuf::from("/daemon/signet/cofferd_rpc")
    );
    cfg.daemon_rpc_path = Some(PathBuf::from("/run/x.sock"));
    assert_eq!(
      cfg.rpc_socket_path(datadir, Network::Signet, Some(&daemon)),
      PathBuf::from("/run/x.sock")
    );
  }

  #[test]
  fn env_log_level_overrides_file() {
    let cfg = GuiConfig {
      log_level: Some(LogLevel::Warn),
      ..GuiConfig::default()
    };
    assert_eq!(cfg.effective_log_level(Some("trace")), LogLevel::Trace);
    assert_eq!(cfg.effective_log_level(Some("nonsense")), LogLevel::Warn);
    assert_eq!(cfg.effective_log_level(None), LogLevel::Warn);
    assert_eq!(
      GuiConfig::default().effective_log_level(None),
      LogLevel::Info
    );
  }

  #[test]
  fn reads_daemon_network_and_ignores_daemon_only_tables() {
    let td = tempfile::tempdir().unwrap();
    let p = td.path().join("daemon.toml");
    fs::write(
      &p,
      r#"
data_dir = "/var/lib/cofferd"
main_descriptor = "wsh(...)"

[bitcoin_config]
network = "regtest"

[bitcoind_config]
addr = "127.0.0.1:18443"
"#,
    )
    .unwrap();
    let cfg = DaemonConfig::from_file(&p).unwrap();
    assert_eq!(cfg.network(), Some(Network::Regtest));
    assert_eq!(cfg.data_dir, Some(PathBuf::from("/var/lib/cofferd")));
  }
}
