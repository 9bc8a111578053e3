pub mod app;
pub mod args;
pub mod commands;
pub mod util;

use std::io::{self, IsTerminal as _};

use clap::Parser;
use coffer_core::config::LogLevel;
use coffer_core::logging::Logger;

use crate::app::App;
use crate::args::{Commands, ConnectArgs};
use crate::util::errors::{CliError, report};

pub fn run() {
  let cli = args::Cli::parse();
  if std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal() {
    yansi::disable();
  }

  let level = App::env_log_level()
    .as_deref()
    .and_then(LogLevel::parse)
    .unwrap_or_default();
  let app = App::new(cli.global, Logger::install(level).ok());

  let command = cli
    .command
    .unwrap_or(Commands::Connect(ConnectArgs::default()));
  let (action, res) = dispatch(&app, &command);
  // Flush logs before a possible exit.
  drop(app);
  if let Err(e) = res {
    report(action, &e);
    std::process::exit(1);
  }
}

fn dispatch(app: &App, command: &Commands) -> (&'static str, Result<(), CliError>) {
  use crate::commands::{connect, devd, networks, setup, wallet};
  match command {
    Commands::Connect(args) => ("connect", connect::connect(app, args)),
    Commands::Info => ("info", wallet::info(app)),
    Commands::Address => ("address", wallet::address(app)),
    Commands::Coins => ("coins", wallet::coins(app)),
    Commands::Spends => ("spends", wallet::spends(app)),
    Commands::Call(args) => ("call", wallet::call(app, args)),
    Commands::Stop => ("stop", wallet::stop(app)),
    Commands::Networks => ("networks", networks::list(app)),
    Commands::Setup(args) => ("setup", setup::setup(app, args)),
    Commands::Devd(args) => ("devd", devd::run_foreground(app, args)),
  }
}
