use coffer_core::config::{default_datadir, gui_config_path};
use coffer_core::resolve::{ResolveError, list_configured_networks};

use crate::app::App;
use crate::util::errors::CliError;

pub fn list(app: &App) -> Result<(), CliError> {
  let datadir = match &app.global.datadir {
    Some(d) => d.clone(),
    None => default_datadir().ok_or(ResolveError::NoDataDir)?,
  };
  let nets = list_configured_networks(&datadir);
  if nets.is_empty() {
    println!("no configured networks in {}", datadir.display());
    return Ok(());
  }
  for net in nets {
    println!(
      "{:<8} {}",
      net.label(),
      gui_config_path(&datadir, net).display()
    );
  }
  Ok(())
}
