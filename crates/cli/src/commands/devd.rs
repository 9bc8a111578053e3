use coffer_core::config::{ConfigError, LogLevel};
use coffer_core::devd::{self, DevdOptions};

use crate::app::App;
use crate::args::DevdArgs;
use crate::util::errors::CliError;
use crate::util::runtime::server_runtime;

/// Run the dev daemon in the foreground. `--conf` names the daemon config,
/// which is how the launcher invokes daemons.
pub fn run_foreground(app: &App, args: &DevdArgs) -> Result<(), CliError> {
  let Some(conf) = &app.global.conf else {
    return Err(CliError::Usage("devd needs --conf <daemon.toml>".to_string()));
  };
  let mut opts = DevdOptions::from_daemon_config(conf).map_err(config_error)?;
  if let Some(sock) = &args.socket {
    opts.socket = sock.clone();
  }
  opts.sync_steps = args.sync_steps;
  let level = App::env_log_level()
    .as_deref()
    .and_then(LogLevel::parse)
    .unwrap_or_default();
  app.log_to_file(&opts.socket.with_file_name("devd.log"), level);

  let rt = server_runtime()?;
  rt.block_on(async move {
    let handle = devd::start(opts).await?;
    handle.wait().await;
    Ok::<_, std::io::Error>(())
  })?;
  Ok(())
}

fn config_error(e: ConfigError) -> CliError {
  CliError::Resolve(e.into())
}
