use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use super::jsonrpc::{self, JsonRpcClient};
use super::model::{GetAddressResult, GetInfoResult, ListCoinsResult, ListSpendResult};

/// Failure of a daemon call, as surfaced to the interface layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DaemonError {
  /// The socket could not be reached or the connection broke.
  #[error("transport ({kind:?}): {message}")]
  Transport { kind: io::ErrorKind, message: String },
  /// The daemon answered with a JSON-RPC error.
  #[error("daemon error {code}: {message}")]
  Rpc { code: i64, message: String },
  #[error("daemon did not answer: {0}")]
  NoAnswer(String),
  /// The daemon answered something this client cannot use.
  #[error("unexpected daemon response: {0}")]
  Unexpected(String),
}

impl DaemonError {
  /// True when nothing is listening on the socket, the only condition under
  /// which launching the daemon can help.
  pub fn is_unreachable(&self) -> bool {
    matches!(
      self,
      DaemonError::Transport {
        kind: io::ErrorKind::NotFound | io::ErrorKind::ConnectionRefused,
        ..
      }
    )
  }
}

impl From<jsonrpc::Error> for DaemonError {
  fn from(err: jsonrpc::Error) -> Self {
    match err {
      jsonrpc::Error::Io(e) => DaemonError::Transport {
        kind: e.kind(),
        message: e.to_string(),
      },
      jsonrpc::Error::Rpc { code, message, .. } => DaemonError::Rpc { code, message },
      jsonrpc::Error::Timeout(limit) => DaemonError::NoAnswer(format!("timed out after {limit:?}")),
      e @ jsonrpc::Error::NoErrorOrResult => DaemonError::NoAnswer(e.to_string()),
      other @ (jsonrpc::Error::Json(_)
      | jsonrpc::Error::NonceMismatch { .. }
      | jsonrpc::Error::VersionMismatch(_)) => DaemonError::Unexpected(other.to_string()),
    }
  }
}

/// Typed client for the wallet daemon's RPC methods.
#[derive(Debug)]
pub struct DaemonClient {
  rpc: JsonRpcClient,
}

impl DaemonClient {
  pub fn new(socket: impl Into<PathBuf>) -> Self {
    Self {
      rpc: JsonRpcClient::new(socket),
    }
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    Self {
      rpc: self.rpc.with_timeout(timeout),
    }
  }

  pub fn socket_path(&self) -> &Path {
    self.rpc.socket_path()
  }

  pub async fn call_raw(&self, method: &str, params: Option<Value>) -> Result<Value, DaemonError> {
    Ok(self.rpc.request(method, params).await?)
  }

  async fn call<T: DeserializeOwned>(&self, method: &str, params: Option<Value>) -> Result<T, DaemonError> {
    let v = self.call_raw(method, params).await?;
    serde_json::from_value(v).map_err(|e| DaemonError::Unexpected(format!("{method}: {e}")))
  }

  pub async fn get_info(&self) -> Result<GetInfoResult, DaemonError> {
    self.call("getinfo", None).await
  }

  pub async fn get_new_address(&self) -> Result<GetAddressResult, DaemonError> {
    self.call("getnewaddress", None).await
  }

  pub async fn list_coins(&self) -> Result<ListCoinsResult, DaemonError> {
    self.call("listcoins", Some(json!({}))).await
  }

  pub async fn list_spend_txs(&self) -> Result<ListSpendResult, DaemonError> {
    self.call("listspendtxs", None).await
  }

  pub async fn stop(&self) -> Result<(), DaemonError> {
    self.call_raw("stop", None).await.map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_missing_or_refused_sockets_are_unreachable() {
    let refused: DaemonError =
      jsonrpc::Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused)).into();
    let missing: DaemonError = jsonrpc::Error::Io(io::Error::from(io::ErrorKind::NotFound)).into();
    let denied: DaemonError =
      jsonrpc::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied)).into();
    let rpc: DaemonError = jsonrpc::Error::Rpc {
      code: -32603,
      message: "boom".into(),
      data: None,
    }
    .into();
    assert!(refused.is_unreachable());
    assert!(missing.is_unreachable());
    assert!(!denied.is_unreachable());
    assert!(!rpc.is_unreachable());
  }

  #[test]
  fn protocol_violations_are_unexpected() {
    let e: DaemonError = jsonrpc::Error::VersionMismatch("\"1.0\"".into()).into();
    assert!(matches!(e, DaemonError::Unexpected(_)));
    let e: DaemonError = jsonrpc::Error::NoErrorOrResult.into();
    assert!(matches!(e, DaemonError::NoAnswer(_)));
  }

  #[tokio::test]
  async fn dialing_a_non_socket_path_counts_as_unreachable() {
    let td = tempfile::tempdir().unwrap();
    let file = td.path().join("plain");
    std::fs::write(&file, b"").unwrap();
    for path in [file, td.path().to_path_buf(), td.path().join("missing")] {
      let err = DaemonClient::new(&path).get_info().await.unwrap_err();
      assert!(err.is_unreachable(), "{}: {err}", path.display());
    }
  }
}
