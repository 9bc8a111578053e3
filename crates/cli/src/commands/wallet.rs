use coffer_core::bootstrap::Connection;
use coffer_core::resolve::{Launch, resolve};
use coffer_core::rpc::{DaemonClient, DaemonError};
use serde_json::Value;

use crate::app::App;
use crate::args::CallArgs;
use crate::commands::connect::establish;
use crate::util::errors::CliError;
use crate::util::runtime::block_on;

fn with_connection<T, F, Fut>(app: &App, f: F) -> Result<T, CliError>
where
  F: FnOnce(Connection) -> Fut,
  Fut: Future<Output = Result<T, DaemonError>>,
{
  let conn = establish(app)?;
  Ok(block_on(f(conn))??)
}

pub fn info(app: &App) -> Result<(), CliError> {
  let conn = establish(app)?;
  let info = conn.info;
  println!("version:   {}", info.version);
  println!("network:   {}", info.network.label());
  println!("height:    {}", info.block_height);
  println!("sync:      {:.1}%", info.sync * 100.0);
  if let Some(p) = info.rescan_progress {
    println!("rescan:    {:.1}%", p * 100.0);
  }
  println!("descriptor {}", info.descriptors.main);
  Ok(())
}

pub fn address(app: &App) -> Result<(), CliError> {
  let addr = with_connection(app, |conn| async move { conn.client.get_new_address().await })?;
  println!("{} (index {})", addr.address, addr.derivation_index);
  Ok(())
}

pub fn coins(app: &App) -> Result<(), CliError> {
  let res = with_connection(app, |conn| async move { conn.client.list_coins().await })?;
  if res.coins.is_empty() {
    println!("no coins");
    return Ok(());
  }
  println!("{:<70} {:>14} {:>8}", "OUTPOINT", "AMOUNT (sat)", "HEIGHT");
  for c in res.coins {
    let height = c
      .block_height
      .map_or_else(|| "-".to_string(), |h| h.to_string());
    println!("{:<70} {:>14} {:>8}", c.outpoint, c.amount_sat, height);
  }
  Ok(())
}

pub fn spends(app: &App) -> Result<(), CliError> {
  let res = with_connection(app, |conn| async move { conn.client.list_spend_txs().await })?;
  if res.spend_txs.is_empty() {
    println!("no spend transactions");
  }
  for tx in res.spend_txs {
    println!("{}", tx.psbt);
  }
  Ok(())
}

pub fn call(app: &App, args: &CallArgs) -> Result<(), CliError> {
  let params: Option<Value> = match &args.params {
    Some(raw) => Some(serde_json::from_str(raw)?),
    None => None,
  };
  let method = args.method.clone();
  let v = with_connection(app, |conn| async move {
    conn.client.call_raw(&method, params).await
  })?;
  println!("{}", serde_json::to_string_pretty(&v)?);
  Ok(())
}

/// Stop a running daemon; never launches or configures one just to stop it.
pub fn stop(app: &App) -> Result<(), CliError> {
  let ctx = match resolve(&app.global.launch_args())? {
    Launch::Run(ctx) => ctx,
    Launch::Install(_) => {
      println!("daemon: stopped");
      return Ok(());
    }
  };
  app.log_to_network(&ctx);
  let client = DaemonClient::new(ctx.socket_path());
  match block_on(client.stop())? {
    Err(e) if !e.is_unreachable() => return Err(e.into()),
    _ => {}
  }
  println!("daemon: stopped");
  Ok(())
}
