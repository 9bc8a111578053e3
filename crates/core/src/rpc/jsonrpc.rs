use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, trace};

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("io: {0}")]
  Io(#[from] io::Error),
  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
  #[error("rpc {code}: {message}")]
  Rpc {
    code: i64,
    message: String,
    data: Option<Value>,
  },
  #[error("response carries neither a result nor an error")]
  NoErrorOrResult,
  #[error("response id {got} does not match request id {expected}")]
  NonceMismatch { expected: u64, got: Value },
  #[error("unsupported jsonrpc version `{0}`")]
  VersionMismatch(String),
  #[error("no response within {0:?}")]
  Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Line-oriented JSON-RPC 2.0 client over a Unix domain socket.
///
/// Each call opens a fresh connection, writes the request followed by `\n`
/// and reads until one complete JSON value has arrived.
#[derive(Debug)]
pub struct JsonRpcClient {
  socket: PathBuf,
  next_id: AtomicU64,
  timeout: Option<Duration>,
}

impl JsonRpcClient {
  pub fn new(socket: impl Into<PathBuf>) -> Self {
    Self {
      socket: socket.into(),
      // Seeded from the pid so concurrent interfaces do not share ids.
      next_id: AtomicU64::new(u64::from(std::process::id()) << 16),
      timeout: None,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  pub fn socket_path(&self) -> &Path {
    &self.socket
  }

  pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    match self.timeout {
      Some(limit) => tokio::time::timeout(limit, self.exchange(id, method, params))
        .await
        .map_err(|_| Error::Timeout(limit))?,
      None => self.exchange(id, method, params).await,
    }
  }

  async fn exchange(&self, id: u64, method: &str, params: Option<Value>) -> Result<Value> {
    let mut req = json!({ "jsonrpc": "2.0", "method": method, "id": id });
    if let Some(params) = params {
      req["params"] = params;
    }
    let mut line = serde_json::to_vec(&req)?;
    line.push(b'\n');

    debug!(event = "rpc_request", method, id, socket = %self.socket.display());
    let mut stream = UnixStream::connect(&self.socket).await?;
    stream.write_all(&line).await?;
    stream.flush().await?;

    let value = read_value(&mut stream).await?;
    trace!(event = "rpc_response", method, id, response = %value);
    unwrap_response(id, value)
  }
}

/// Read from `stream` until the buffered bytes form one complete JSON value.
async fn read_value(stream: &mut UnixStream) -> Result<Value> {
  let mut buf = Vec::with_capacity(1024);
  let mut chunk = [0u8; 4096];
  loop {
    let n = stream.read(&mut chunk).await?;
    if n == 0 {
      return Err(Error::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "daemon closed the connection before answering",
      )));
    }
    buf.extend_from_slice(&chunk[..n]);
    let mut values = serde_json::Deserializer::from_slice(&buf).into_iter::<Value>();
    match values.next() {
      Some(Ok(v)) => return Ok(v),
      Some(Err(e)) if e.is_eof() => continue,
      Some(Err(e)) => return Err(Error::Json(e)),
      None => continue,
    }
  }
}

fn unwrap_response(id: u64, value: Value) -> Result<Value> {
  let Value::Object(mut obj) = value else {
    return Err(Error::NoErrorOrResult);
  };
  if let Some(version) = obj.get("jsonrpc")
    && version.as_str() != Some("2.0")
  {
    return Err(Error::VersionMismatch(version.to_string()));
  }
  let got = obj.remove("id").unwrap_or(Value::Null);
  if got.as_u64() != Some(id) {
    return Err(Error::NonceMismatch { expected: id, got });
  }
  if let Some(err) = obj.remove("error")
    && !err.is_null()
  {
    return Err(rpc_error(err));
  }
  obj.remove("result").ok_or(Error::NoErrorOrResult)
}

fn rpc_error(err: Value) -> Error {
  let empty = Map::new();
  let fields = err.as_object().unwrap_or(&empty);
  let code = fields
    .get("code")
    .and_then(Value::as_i64)
    .unwrap_or(-32000);
  let message = match fields.get("message").and_then(Value::as_str) {
    Some(m) => m.to_string(),
    None => err.to_string(),
  };
  Error::Rpc {
    code,
    message,
    data: fields.get("data").cloned(),
  }
}
