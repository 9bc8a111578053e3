use std::path::Path;

use coffer_core::config::{LOG_LEVEL_ENV, LogLevel};
use coffer_core::logging::Logger;
use coffer_core::resolve::RunContext;

use crate::args::GlobalArgs;

/// Per-invocation state shared by all commands.
pub struct App {
  pub global: GlobalArgs,
  logger: Option<Logger>,
}

impl App {
  pub fn new(global: GlobalArgs, logger: Option<Logger>) -> Self {
    Self { global, logger }
  }

  /// Level requested through `LOG_LEVEL`, if any.
  pub fn env_log_level() -> Option<String> {
    std::env::var(LOG_LEVEL_ENV).ok()
  }

  pub fn log_to_installer(&self, datadir: &Path) {
    if let Some(logger) = &self.logger
      && let Err(e) = logger.set_installer_mode(datadir)
    {
      eprintln!("warning: {e}");
    }
  }

  pub fn log_to_network(&self, ctx: &RunContext) {
    let Some(logger) = &self.logger else {
      return;
    };
    if let Err(e) = logger.set_running_mode(&ctx.datadir, ctx.network) {
      eprintln!("warning: {e}");
    }
    let env_level = Self::env_log_level();
    let _ = logger.set_level(ctx.config.effective_log_level(env_level.as_deref()));
  }

  pub fn log_to_file(&self, path: &Path, level: LogLevel) {
    if let Some(logger) = &self.logger {
      if let Err(e) = logger.log_to_file(path) {
        eprintln!("warning: {e}");
      }
      let _ = logger.set_level(level);
    }
  }

  pub fn setup_finished(&self, datadir: &Path) {
    if let Some(logger) = &self.logger {
      let _ = logger.remove_installer_log(datadir);
    }
  }
}
