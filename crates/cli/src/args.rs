use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use coffer_core::Network;
use coffer_core::resolve::LaunchArgs;

#[derive(Debug, Parser)]
#[command(version, about = "Coffer: terminal front end for a wallet daemon", long_about = None, bin_name = "coffer")]
pub struct Cli {
  #[command(flatten)]
  pub global: GlobalArgs,
  #[command(subcommand)]
  pub command: Option<Commands>,
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct GlobalArgs {
  /// Data directory holding one sub-directory per network
  #[arg(long, global = true, value_name = "PATH", conflicts_with = "conf")]
  pub datadir: Option<PathBuf>,
  /// Interface config file to use instead of `<datadir>/<network>/gui.toml`
  #[arg(long, global = true, value_name = "PATH")]
  pub conf: Option<PathBuf>,
  /// Use mainnet (default)
  #[arg(
    long,
    global = true,
    visible_alias = "bitcoin",
    conflicts_with_all = ["testnet", "signet", "regtest"]
  )]
  pub mainnet: bool,
  #[arg(long, global = true, conflicts_with_all = ["signet", "regtest"])]
  pub testnet: bool,
  #[arg(long, global = true, conflicts_with = "regtest")]
  pub signet: bool,
  #[arg(long, global = true)]
  pub regtest: bool,
}

impl GlobalArgs {
  /// The selected network, if a network flag was given.
  pub fn network(&self) -> Option<Network> {
    [
      (self.mainnet, Network::Mainnet),
      (self.testnet, Network::Testnet),
      (self.signet, Network::Signet),
      (self.regtest, Network::Regtest),
    ]
    .into_iter()
    .find_map(|(set, net)| set.then_some(net))
  }

  pub fn launch_args(&self) -> LaunchArgs {
    LaunchArgs {
      conf: self.conf.clone(),
      datadir: self.datadir.clone(),
      network: self.network(),
    }
  }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
  /// Connect to the daemon, starting it if needed (default)
  Connect(ConnectArgs),
  /// Show daemon information
  Info,
  /// Derive a new receive address
  Address,
  /// List wallet coins
  Coins,
  /// List stored spend transactions
  Spends,
  /// Call a daemon RPC method directly
  Call(CallArgs),
  /// Ask the daemon to shut down
  Stop,
  /// List networks configured in the data directory
  Networks,
  /// Write a configuration for the selected network
  Setup(SetupArgs),
  /// Run the development daemon (foreground)
  #[command(hide = true)]
  Devd(DevdArgs),
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct ConnectArgs {
  /// Wait until the daemon reports a synced chain
  #[arg(long)]
  pub wait_sync: bool,
}

#[derive(Debug, ClapArgs)]
pub struct CallArgs {
  /// RPC method name, e.g. `getinfo`
  pub method: String,
  /// Parameters as a JSON object or array
  pub params: Option<String>,
}

#[derive(Debug, Clone, Default, ClapArgs)]
pub struct SetupArgs {
  /// Accept every default without prompting
  #[arg(long, short = 'y')]
  pub defaults: bool,
}

#[derive(Debug, ClapArgs)]
pub struct DevdArgs {
  /// Socket to listen on; derived from the daemon config when omitted
  #[arg(long, value_name = "PATH")]
  pub socket: Option<PathBuf>,
  /// Number of `getinfo` calls until the chain reports synced
  #[arg(long, default_value_t = 0)]
  pub sync_steps: u32,
}
