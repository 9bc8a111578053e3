use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::Network;

/// Log level for the interface and the bundled dev daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Off,
  Error,
  Warn,
  #[default]
  Info,
  Debug,
  Trace,
}

impl LogLevel {
  pub fn as_filter(self) -> &'static str {
    match self {
      LogLevel::Off => "off",
      LogLevel::Error => "error",
      LogLevel::Warn => "warn",
      LogLevel::Info => "info",
      LogLevel::Debug => "debug",
      LogLevel::Trace => "trace",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "off" => Some(LogLevel::Off),
      "error" => Some(LogLevel::Error),
      "warn" | "warning" => Some(LogLevel::Warn),
      "info" => Some(LogLevel::Info),
      "debug" => Some(LogLevel::Debug),
      "trace" => Some(LogLevel::Trace),
      _ => None,
    }
  }
}

/// How long and how often to retry after launching the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
  /// Give up on a freshly launched daemon after this many seconds (defaults to 15)
  pub start_timeout_secs: u64,
  /// First delay between reachability probes (defaults to 50ms)
  pub initial_backoff_ms: u64,
  /// Upper bound for the doubling delay (defaults to 1s)
  pub max_backoff_ms: u64,
}

impl Default for LauncherConfig {
  fn default() -> Self {
    Self {
      start_timeout_secs: 15,
      initial_backoff_ms: 50,
      max_backoff_ms: 1000,
    }
  }
}

/// Interface configuration stored as `<datadir>/<network>/gui.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GuiConfig {
  /// Daemon configuration file, required to launch the daemon
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub daemon_config_path: Option<PathBuf>,
  /// Explicit RPC socket of an externally managed daemon
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub daemon_rpc_path: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub log_level: Option<LogLevel>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub debug: Option<bool>,
  /// argv used to launch the daemon; `--conf <daemon_config_path>` is appended
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub daemon_command: Option<Vec<String>>,
  #[serde(default)]
  pub launcher: LauncherConfig,
}

/// The part of the daemon's own configuration the interface reads.
/// Everything else in the file belongs to the daemon and is ignored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DaemonConfig {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data_dir: Option<PathBuf>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub log_level: Option<LogLevel>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bitcoin_config: Option<BitcoinConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinConfig {
  pub network: Network,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {}", path.display())]
  NotFound { path: PathBuf },
  #[error("config file {} sets neither daemon_config_path nor daemon_rpc_path", path.display())]
  MissingFields { path: PathBuf },
  #[error("reading {}: {source}", path.display())]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("parsing {}: {source}", path.display())]
  Toml {
    path: PathBuf,
    source: toml::de::Error,
  },
  #[error("serializing config: {0}")]
  Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
  /// Missing or incomplete configuration is recoverable through setup.
  pub fn wants_installer(&self) -> bool {
    matches!(
      self,
      ConfigError::NotFound { .. } | ConfigError::MissingFields { .. }
    )
  }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
