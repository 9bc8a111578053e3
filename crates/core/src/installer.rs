//! First-run setup: create the datadir and write the configuration files
//! the resolver looks for.

use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt as _;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::{
  ConfigError, DaemonConfig, GuiConfig, daemon_config_path, gui_config_path, network_dir,
};
use crate::network::Network;
use crate::resolve::InstallContext;

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("{} already holds a complete configuration", path.display())]
  AlreadyConfigured { path: PathBuf },
  #[error("creating {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: io::Error },
  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Answers collected by the setup flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallAnswers {
  pub daemon_config_path: PathBuf,
  pub daemon_rpc_path: Option<PathBuf>,
  pub daemon_command: Option<Vec<String>>,
}

impl InstallAnswers {
  pub fn defaults(datadir: &Path, network: Network) -> Self {
    Self {
      daemon_config_path: daemon_config_path(datadir, network),
      daemon_rpc_path: None,
      daemon_command: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstallOutcome {
  pub gui_config_path: PathBuf,
  pub config: GuiConfig,
  pub wrote_daemon_config: bool,
}

#[derive(Debug, Clone)]
pub struct Installer {
  datadir: PathBuf,
  network: Network,
}

impl Installer {
  pub fn new(datadir: impl Into<PathBuf>, network: Network) -> Self {
    Self {
      datadir: datadir.into(),
      network,
    }
  }

  pub fn from_context(ctx: &InstallContext) -> Self {
    Self::new(ctx.datadir.clone(), ctx.network)
  }

  pub fn datadir(&self) -> &Path {
    &self.datadir
  }

  pub fn network(&self) -> Network {
    self.network
  }

  /// Create the datadir (owner-only) and the network directory.
  pub fn prepare(&self) -> Result<(), InstallError> {
    for dir in [self.datadir.clone(), network_dir(&self.datadir, self.network)] {
      DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(&dir)
        .map_err(|source| InstallError::CreateDir { path: dir, source })?;
    }
    Ok(())
  }

  /// Write the daemon config (when missing) and the interface config.
  /// Only a missing or incomplete interface config is replaced; a complete,
  /// malformed or unreadable one is left untouched.
  pub fn install(&self, answers: &InstallAnswers) -> Result<InstallOutcome, InstallError> {
    let path = gui_config_path(&self.datadir, self.network);
    match GuiConfig::from_file(&path) {
      Ok(_) => return Err(InstallError::AlreadyConfigured { path }),
      Err(e) if e.wants_installer() => {}
      Err(e) => return Err(e.into()),
    }
    self.prepare()?;

    let wrote_daemon_config = !answers.daemon_config_path.exists();
    if wrote_daemon_config {
      DaemonConfig::template(&self.datadir, self.network).write_to(&answers.daemon_config_path)?;
      info!(event = "daemon_config_written", path = %answers.daemon_config_path.display(), "wrote daemon config template");
    }

    let config = GuiConfig {
      daemon_config_path: Some(answers.daemon_config_path.clone()),
      daemon_rpc_path: answers.daemon_rpc_path.clone(),
      daemon_command: answers.daemon_command.clone(),
      ..GuiConfig::default()
    };
    config.write_to(&path)?;
    info!(event = "gui_config_written", path = %path.display(), network = %self.network, "setup complete");
    Ok(InstallOutcome {
      gui_config_path: path,
      config,
      wrote_daemon_config,
    })
  }
}

/// Remove a file if present; missing files are fine.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<()> {
  match fs::remove_file(path) {
    Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
    _ => Ok(()),
  }
}
