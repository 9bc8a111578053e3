use std::env;
use std::path::{Path, PathBuf};

use crate::network::Network;

/// Overrides the platform default datadir when set.
pub const DATADIR_ENV: &str = "COFFER_DATADIR";
pub const GUI_CONFIG_FILE: &str = "gui.toml";
pub const DAEMON_CONFIG_FILE: &str = "daemon.toml";
pub const SOCKET_FILE: &str = "cofferd_rpc";
pub const LOG_FILE: &str = "coffer.log";
pub const INSTALLER_LOG_FILE: &str = "installer.log";

/// Default datadir: `$COFFER_DATADIR`, else `~/.coffer` on Linux and
/// `<config dir>/Coffer` elsewhere. The network never enters this path.
pub fn default_datadir() -> Option<PathBuf> {
  default_datadir_for(env::var_os(DATADIR_ENV).map(PathBuf::from))
}

pub(crate) fn default_datadir_for(env_datadir: Option<PathBuf>) -> Option<PathBuf> {
  if let Some(dir) = env_datadir.filter(|d| !d.as_os_str().is_empty()) {
    return Some(dir);
  }
  platform_datadir()
}

#[cfg(target_os = "linux")]
fn platform_datadir() -> Option<PathBuf> {
  dirs::home_dir().map(|home| home.join(".coffer"))
}

#[cfg(not(target_os = "linux"))]
fn platform_datadir() -> Option<PathBuf> {
  dirs::config_dir().map(|dir| dir.join("Coffer"))
}

pub fn network_dir(datadir: &Path, network: Network) -> PathBuf {
  datadir.join(network.dir_name())
}

/// Location of the interface config (`<datadir>/<network>/gui.toml`)
pub fn gui_config_path(datadir: &Path, network: Network) -> PathBuf {
  network_dir(datadir, network).join(GUI_CONFIG_FILE)
}

/// Where setup writes a daemon config when none is supplied
pub fn daemon_config_path(datadir: &Path, network: Network) -> PathBuf {
  network_dir(datadir, network).join(DAEMON_CONFIG_FILE)
}

pub fn default_socket_path(datadir: &Path, network: Network) -> PathBuf {
  network_dir(datadir, network).join(SOCKET_FILE)
}

pub fn log_path(datadir: &Path, network: Network) -> PathBuf {
  network_dir(datadir, network).join(LOG_FILE)
}

pub fn installer_log_path(datadir: &Path) -> PathBuf {
  datadir.join(INSTALLER_LOG_FILE)
}
