use std::time::Duration;

use anyhow::anyhow;
use coffer_core::bootstrap::{
  Bootstrap, BootstrapOptions, Connection, ConnectionState, Session, wait_synced,
};
use coffer_core::installer::Installer;
use coffer_core::resolve::{InstallReason, Launch, RunContext, resolve};
use tracing::info;
use yansi::Paint as _;

use crate::app::App;
use crate::args::ConnectArgs;
use crate::commands::setup::run_installer;
use crate::util::errors::CliError;
use crate::util::runtime::block_on;
use crate::util::wizard::Wizard;

/// Resolve the configuration, running setup first when there is none.
pub fn resolve_or_install(app: &App, session: &mut Session) -> Result<RunContext, CliError> {
  let args = app.global.launch_args();
  let install = match resolve(&args)? {
    Launch::Run(ctx) => return Ok(ctx),
    Launch::Install(install) => install,
  };

  session.advance(ConnectionState::ConfiguringViaInstaller);
  app.log_to_installer(&install.datadir);
  let why = match install.reason {
    InstallReason::ConfigNotFound => "No configuration found",
    InstallReason::MissingFields => "Configuration is incomplete",
  };
  println!(
    "{} for {} in {}; starting setup.",
    why,
    install.network.label(),
    install.datadir.display()
  );

  let installer = Installer::from_context(&install);
  if let Err(e) = run_installer(&installer, &Wizard::new(), false) {
    session.advance(ConnectionState::ConnectionFailed);
    return Err(e);
  }
  app.setup_finished(&install.datadir);

  match resolve(&args)? {
    Launch::Run(ctx) => Ok(ctx),
    Launch::Install(_) => {
      session.advance(ConnectionState::ConnectionFailed);
      Err(CliError::Setup(anyhow!("configuration is still incomplete after setup")))
    }
  }
}

/// Resolve, then locate or launch the daemon.
pub fn establish(app: &App) -> Result<Connection, CliError> {
  let mut session = Session::new();
  let ctx = resolve_or_install(app, &mut session)?;
  app.log_to_network(&ctx);

  let opts = BootstrapOptions::from_run(&ctx);
  session.advance(ConnectionState::Connecting);
  match block_on(Bootstrap::new(opts).connect())? {
    Ok(conn) => {
      session.advance(ConnectionState::Connected);
      info!(event = "session_connected", launched = conn.launched, history = ?session.history(), "connected to daemon");
      Ok(conn)
    }
    Err(e) => {
      session.advance(ConnectionState::ConnectionFailed);
      Err(e.into())
    }
  }
}

pub fn connect(app: &App, args: &ConnectArgs) -> Result<(), CliError> {
  let conn = establish(app)?;
  if conn.launched {
    println!("daemon: started");
  }
  let mut info = conn.info.clone();
  if args.wait_sync && !info.is_synced() {
    info = block_on(wait_synced(&conn.client, Duration::from_secs(1), |i| {
      println!("syncing: {:.0}%", i.sync * 100.0);
    }))??;
  }
  println!(
    "{} (v{}, {}, block {}, sync {:.0}%, socket {})",
    "daemon: connected".green(),
    info.version,
    info.network.label(),
    info.block_height,
    info.sync * 100.0,
    conn.client.socket_path().display()
  );
  Ok(())
}
