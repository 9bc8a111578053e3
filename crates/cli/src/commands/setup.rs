use std::path::PathBuf;

use coffer_core::config::default_datadir;
use coffer_core::installer::{InstallAnswers, InstallOutcome, Installer};
use coffer_core::resolve::ResolveError;
use yansi::Paint as _;

use crate::app::App;
use crate::args::SetupArgs;
use crate::util::errors::CliError;
use crate::util::wizard::Wizard;

/// Collect answers (or take the defaults) and write the configuration.
pub fn run_installer(
  installer: &Installer,
  wizard: &Wizard,
  use_defaults: bool,
) -> Result<InstallOutcome, CliError> {
  let mut answers = InstallAnswers::defaults(installer.datadir(), installer.network());
  if !use_defaults {
    let conf = wizard
      .text(
        "Daemon config file",
        &answers.daemon_config_path.display().to_string(),
      )
      .map_err(CliError::Setup)?;
    answers.daemon_config_path = PathBuf::from(conf);
    answers.daemon_rpc_path = wizard
      .optional("Daemon RPC socket (empty: derive from the daemon config)")
      .map_err(CliError::Setup)?
      .map(PathBuf::from);
    let default_cmd = vec!["cofferd".to_string()];
    let cmd = wizard
      .command("Daemon launch command", &default_cmd)
      .map_err(CliError::Setup)?;
    answers.daemon_command = Some(cmd).filter(|c| !c.is_empty() && *c != default_cmd);
  }

  let outcome = installer.install(&answers)?;
  if outcome.wrote_daemon_config {
    println!(
      "wrote daemon config {}",
      answers.daemon_config_path.display()
    );
  }
  println!(
    "{} {}",
    "wrote".green(),
    outcome.gui_config_path.display()
  );
  Ok(outcome)
}

pub fn setup(app: &App, args: &SetupArgs) -> Result<(), CliError> {
  if app.global.conf.is_some() {
    return Err(CliError::Usage(
      "setup writes into the data directory; use --datadir instead of --conf".to_string(),
    ));
  }
  let datadir = match &app.global.datadir {
    Some(d) => d.clone(),
    None => default_datadir().ok_or(ResolveError::NoDataDir)?,
  };
  let network = app.global.network().unwrap_or_default();
  app.log_to_installer(&datadir);
  let installer = Installer::new(datadir.clone(), network);
  run_installer(&installer, &Wizard::new(), args.defaults)?;
  app.setup_finished(&datadir);
  Ok(())
}
