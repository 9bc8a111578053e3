use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Temporary datadir for tests, laid out like a real one:
/// `<root>/<network>/gui.toml` and friends.
pub struct TempDatadir {
  pub root: tempfile::TempDir,
}

impl Default for TempDatadir {
  fn default() -> Self {
    Self::new()
  }
}

impl TempDatadir {
  pub fn new() -> Self {
    // Unix socket paths are length limited; keep the prefix short.
    let root = tempfile::Builder::new()
      .prefix("cof")
      .tempdir()
      .expect("tempdir");
    Self { root }
  }

  pub fn path(&self) -> PathBuf {
    self.root.path().to_path_buf()
  }

  /// `<root>/<network>`, created on demand.
  pub fn network_dir(&self, network: &str) -> PathBuf {
    let p = self.path().join(network);
    fs::create_dir_all(&p).expect("mkdir network dir");
    p
  }

  pub fn socket_path(&self, network: &str) -> PathBuf {
    self.network_dir(network).join("cofferd_rpc")
  }

  /// Write a daemon config for `network` whose data_dir is this root.
  pub fn write_daemon_config(&self, network: &str) -> PathBuf {
    let p = self.network_dir(network).join("daemon.toml");
    let body = format!(
      "data_dir = {:?}\n\n[bitcoin_config]\nnetwork = {:?}\n",
      self.path().display().to_string(),
      network
    );
    fs::write(&p, body).expect("write daemon.toml");
    p
  }

  /// Write `gui.toml` for `network` with the given TOML body.
  pub fn write_gui_config(&self, network: &str, body: &str) -> PathBuf {
    let p = self.network_dir(network).join("gui.toml");
    fs::write(&p, body).expect("write gui.toml");
    p
  }

  /// Write a `gui.toml` that launches the daemon with `command`.
  pub fn write_launchable_config(&self, network: &str, command: &[&str]) -> PathBuf {
    let daemon_conf = self.write_daemon_config(network);
    let argv = command
      .iter()
      .map(|a| format!("{a:?}"))
      .collect::<Vec<_>>()
      .join(", ");
    let body = format!(
      "daemon_config_path = {:?}\ndaemon_command = [{argv}]\n\n[launcher]\nstart_timeout_secs = 10\n",
      daemon_conf.display().to_string()
    );
    self.write_gui_config(network, &body)
  }
}

/// Poll a condition repeatedly until it returns true or times out.
/// Returns true if condition met, false on timeout.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> bool
where
  F: FnMut() -> Fut,
  Fut: std::future::Future<Output = bool>,
{
  use tokio::time::{Instant, sleep};
  let start = Instant::now();
  loop {
    if check().await {
      return true;
    }
    if start.elapsed() >= timeout {
      return false;
    }
    sleep(interval).await;
  }
}

/// Minimal JSON-RPC 2.0 response wrapper for tests.
#[derive(Debug, serde::Deserialize)]
pub struct RpcError {
  pub code: i64,
  pub message: String,
  pub data: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
pub struct RpcResp<T> {
  pub jsonrpc: String,
  pub id: serde_json::Value,
  pub result: Option<T>,
  pub error: Option<RpcError>,
}

/// A tiny line-delimited JSON-RPC client used by tests.
pub struct LineRpcClient {
  sock: PathBuf,
}

impl LineRpcClient {
  pub fn new<P: AsRef<Path>>(sock: P) -> Self {
    Self {
      sock: sock.as_ref().to_path_buf(),
    }
  }

  /// Send one raw line and return the parsed reply line.
  pub async fn send_line(&self, line: &str) -> serde_json::Value {
    let stream = UnixStream::connect(&self.sock).await.expect("connect");
    let (read, mut write) = stream.into_split();
    write.write_all(line.as_bytes()).await.expect("write");
    write.write_all(b"\n").await.expect("write newline");
    let mut reply = String::new();
    BufReader::new(read)
      .read_line(&mut reply)
      .await
      .expect("read reply");
    serde_json::from_str(&reply).expect("reply is json")
  }

  pub async fn call<T: serde::de::DeserializeOwned>(
    &self,
    method: &str,
    params: Option<serde_json::Value>,
  ) -> RpcResp<T> {
    let mut req = serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": method });
    if let Some(p) = params {
      req["params"] = p;
    }
    let v = self.send_line(&req.to_string()).await;
    serde_json::from_value(v).expect("decode rpc response")
  }

  pub async fn is_up(&self) -> bool {
    UnixStream::connect(&self.sock).await.is_ok()
  }
}
