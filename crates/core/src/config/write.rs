use std::fs;
use std::path::Path;

use super::types::{BitcoinConfig, ConfigError, DaemonConfig, GuiConfig, Result};
use crate::network::Network;

fn write_toml(path: &Path, body: String) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  fs::write(path, body).map_err(|source| ConfigError::Io {
    path: path.to_path_buf(),
    source,
  })
}

impl GuiConfig {
  /// Write this config, creating parent directories as needed.
  pub fn write_to(&self, path: &Path) -> Result<()> {
    let mut s = String::from(
      "# Override the daemon launch command. `--conf <daemon_config_path>` is appended.\n# daemon_command = [\"cofferd\"]\n\n",
    );
    s.push_str(&toml::to_string_pretty(self)?);
    write_toml(path, s)
  }
}

impl DaemonConfig {
  /// Minimal daemon config for a fresh datadir.
  pub fn template(data_dir: &Path, network: Network) -> DaemonConfig {
    DaemonConfig {
      data_dir: Some(data_dir.to_path_buf()),
      log_level: None,
      bitcoin_config: Some(BitcoinConfig {
        network,
        poll_interval_secs: Some(30),
      }),
    }
  }

  pub fn write_to(&self, path: &Path) -> Result<()> {
    write_toml(path, toml::to_string_pretty(self)?)
  }
}
