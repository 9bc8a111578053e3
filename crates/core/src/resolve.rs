//! Turn command line selectors into either a runnable configuration or a
//! request to run setup.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, DaemonConfig, GuiConfig, default_datadir, gui_config_path};
use crate::network::Network;

/// Raw selectors as given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
  pub conf: Option<PathBuf>,
  pub datadir: Option<PathBuf>,
  pub network: Option<Network>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Launch {
  Run(RunContext),
  Install(InstallContext),
}

/// A usable configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
  pub datadir: PathBuf,
  pub network: Network,
  pub config: GuiConfig,
  pub config_path: PathBuf,
  /// Daemon config named by `config.daemon_config_path`, when readable
  pub daemon: Option<DaemonConfig>,
}

impl RunContext {
  pub fn socket_path(&self) -> PathBuf {
    self
      .config
      .rpc_socket_path(&self.datadir, self.network, self.daemon.as_ref())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
  ConfigNotFound,
  MissingFields,
}

/// No usable configuration: setup should run for this datadir/network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
  pub datadir: PathBuf,
  pub network: Network,
  pub reason: InstallReason,
}

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error("could not determine a data directory; pass --datadir")]
  NoDataDir,
  #[error("cannot guess the network of {}; set [bitcoin_config] network in the daemon config or pass a network flag", path.display())]
  CannotGuessNetwork { path: PathBuf },
}

pub fn resolve(args: &LaunchArgs) -> Result<Launch, ResolveError> {
  match &args.conf {
    Some(conf) => resolve_explicit(conf, args).map(Launch::Run),
    None => resolve_derived(args),
  }
}

/// `--conf` names the interface config directly; datadir and network come
/// from the daemon config it references.
fn resolve_explicit(conf: &Path, args: &LaunchArgs) -> Result<RunContext, ResolveError> {
  if let Some(dd) = &args.datadir {
    warn!(event = "datadir_ignored", datadir = %dd.display(), conf = %conf.display(), "--datadir is ignored when --conf is given");
  }
  let config = GuiConfig::from_file(conf)?;
  let daemon = match &config.daemon_config_path {
    Some(p) => Some(DaemonConfig::from_file(p)?),
    None => None,
  };
  let network = daemon
    .as_ref()
    .and_then(DaemonConfig::network)
    .or(args.network)
    .ok_or_else(|| ResolveError::CannotGuessNetwork {
      path: conf.to_path_buf(),
    })?;
  let datadir = daemon
    .as_ref()
    .and_then(|d| d.data_dir.clone())
    .or_else(default_datadir)
    .ok_or(ResolveError::NoDataDir)?;
  info!(event = "config_resolved", mode = "explicit", conf = %conf.display(), network = %network, "configuration resolved");
  Ok(RunContext {
    datadir,
    network,
    config,
    config_path: conf.to_path_buf(),
    daemon,
  })
}

fn resolve_derived(args: &LaunchArgs) -> Result<Launch, ResolveError> {
  let datadir = match &args.datadir {
    Some(d) => d.clone(),
    None => default_datadir().ok_or(ResolveError::NoDataDir)?,
  };
  let network = args.network.unwrap_or_default();
  let path = gui_config_path(&datadir, network);

  let config = match GuiConfig::from_file(&path) {
    Ok(cfg) => cfg,
    Err(e) if e.wants_installer() => {
      let reason = match e {
        ConfigError::MissingFields { .. } => InstallReason::MissingFields,
        _ => InstallReason::ConfigNotFound,
      };
      info!(event = "config_missing", path = %path.display(), reason = ?reason, "no usable configuration; routing to setup");
      return Ok(Launch::Install(InstallContext {
        datadir,
        network,
        reason,
      }));
    }
    Err(e) => return Err(e.into()),
  };

  // A stale daemon config path must not keep an already running daemon
  // from being reached, so read failures are only logged here.
  let daemon = config
    .daemon_config_path
    .as_deref()
    .and_then(|p| match DaemonConfig::from_file(p) {
      Ok(d) => Some(d),
      Err(e) => {
        warn!(event = "daemon_config_unreadable", path = %p.display(), error = %e, "could not read daemon config");
        None
      }
    });
  info!(event = "config_resolved", mode = "derived", conf = %path.display(), network = %network, "configuration resolved");
  Ok(Launch::Run(RunContext {
    datadir,
    network,
    config,
    config_path: path,
    daemon,
  }))
}

/// Networks that already have an interface config under `datadir`.
pub fn list_configured_networks(datadir: &Path) -> Vec<Network> {
  Network::ALL
    .into_iter()
    .filter(|n| gui_config_path(datadir, *n).is_file())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use std::fs;

  fn write_gui(datadir: &Path, network: Network, body: &str) -> PathBuf {
    let p = gui_config_path(datadir, network);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(&p, body).unwrap();
    p
  }

  #[test]
  fn empty_datadir_routes_to_installer() {
    let td = tempfile::tempdir().unwrap();
    let launch = resolve(&LaunchArgs {
      datadir: Some(td.path().to_path_buf()),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(
      launch,
      Launch::Install(InstallContext {
        datadir: td.path().to_path_buf(),
        network: Network::Mainnet,
        reason: InstallReason::ConfigNotFound,
      })
    );
  }

  #[test]
  fn incomplete_config_routes_to_installer() {
    let td = tempfile::tempdir().unwrap();
    write_gui(td.path(), Network::Signet, "log_level = \"info\"\n");
    let launch = resolve(&LaunchArgs {
      datadir: Some(td.path().to_path_buf()),
      network: Some(Network::Signet),
      ..Default::default()
    })
    .unwrap();
    match launch {
      Launch::Install(ctx) => assert_eq!(ctx.reason, InstallReason::MissingFields),
      other => panic!("expected install, got {other:?}"),
    }
  }

  #[test]
  fn broken_config_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    write_gui(td.path(), Network::Mainnet, "daemon_rpc_path = ");
    let err = resolve(&LaunchArgs {
      datadir: Some(td.path().to_path_buf()),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, ResolveError::Config(ConfigError::Toml { .. })));
  }

  #[test]
  fn derived_config_is_loaded_for_the_selected_network() {
    let td = tempfile::tempdir().unwrap();
    write_gui(
      td.path(),
      Network::Regtest,
      "daemon_rpc_path = \"/run/cofferd.sock\"\n",
    );
    let Launch::Run(ctx) = resolve(&LaunchArgs {
      datadir: Some(td.path().to_path_buf()),
      network: Some(Network::Regtest),
      ..Default::default()
    })
    .unwrap() else {
      panic!("expected run");
    };
    assert_eq!(ctx.network, Network::Regtest);
    assert_eq!(ctx.socket_path(), PathBuf::from("/run/cofferd.sock"));
  }

  #[test]
  fn conf_bypasses_datadir_and_takes_network_from_daemon() {
    let td = tempfile::tempdir().unwrap();
    let daemon_dir = td.path().join("daemon-data");
    let daemon_conf = td.path().join("daemon.toml");
    DaemonConfig::template(&daemon_dir, Network::Testnet)
      .write_to(&daemon_conf)
      .unwrap();
    let conf = td.path().join("elsewhere.toml");
    GuiConfig {
      daemon_config_path: Some(daemon_conf),
      ..GuiConfig::default()
    }
    .write_to(&conf)
    .unwrap();

    // The datadir points at a tree with a different, valid config.
    let decoy = td.path().join("decoy");
    write_gui(&decoy, Network::Mainnet, "daemon_rpc_path = \"/decoy\"\n");

    let Launch::Run(ctx) = resolve(&LaunchArgs {
      conf: Some(conf.clone()),
      datadir: Some(decoy),
      network: Some(Network::Mainnet),
    })
    .unwrap() else {
      panic!("expected run");
    };
    assert_eq!(ctx.config_path, conf);
    assert_eq!(ctx.network, Network::Testnet);
    assert_eq!(ctx.datadir, daemon_dir);
    assert_eq!(
      ctx.socket_path(),
      daemon_dir.join("testnet").join("cofferd_rpc")
    );
  }

  #[test]
  fn conf_without_daemon_config_needs_a_network() {
    let td = tempfile::tempdir().unwrap();
    let conf = td.path().join("gui.toml");
    fs::write(&conf, "daemon_rpc_path = \"/run/x\"\n").unwrap();
    let err = resolve(&LaunchArgs {
      conf: Some(conf.clone()),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, ResolveError::CannotGuessNetwork { .. }));

    let launch = resolve(&LaunchArgs {
      conf: Some(conf),
      network: Some(Network::Signet),
      datadir: Some(td.path().to_path_buf()),
    });
    match launch {
      Ok(Launch::Run(ctx)) => assert_eq!(ctx.network, Network::Signet),
      Ok(other) => panic!("expected run, got {other:?}"),
      // No home directory in the sandbox: acceptable, nothing else is.
      Err(ResolveError::NoDataDir) => {}
      Err(e) => panic!("unexpected error: {e}"),
    }
  }

  #[test]
  fn missing_explicit_conf_is_an_error_not_setup() {
    let td = tempfile::tempdir().unwrap();
    let err = resolve(&LaunchArgs {
      conf: Some(td.path().join("nope.toml")),
      ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(
      err,
      ResolveError::Config(ConfigError::NotFound { .. })
    ));
  }

  #[test]
  fn lists_networks_with_configs() {
    let td = tempfile::tempdir().unwrap();
    write_gui(td.path(), Network::Regtest, "daemon_rpc_path = \"/x\"\n");
    write_gui(td.path(), Network::Mainnet, "daemon_rpc_path = \"/y\"\n");
    assert_eq!(
      list_configured_networks(td.path()),
      vec![Network::Mainnet, Network::Regtest]
    );
  }
}
