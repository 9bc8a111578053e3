//! JSON-RPC bridge to the wallet daemon.
//!
//! [`jsonrpc::JsonRpcClient`] speaks the raw wire protocol: one request
//! object per connection, terminated by `\n`, answered by one JSON value.
//! [`DaemonClient`] adds typed calls and folds every failure into
//! [`DaemonError`] for the interface layer.

mod daemon;
pub mod jsonrpc;
mod model;

pub use daemon::{DaemonClient, DaemonError};
pub use model::*;

/// JSON-RPC error codes shared with the daemon.
pub mod codes {
  pub const PARSE_ERROR: i64 = -32700;
  pub const INVALID_REQUEST: i64 = -32600;
  pub const METHOD_NOT_FOUND: i64 = -32601;
  pub const INVALID_PARAMS: i64 = -32602;
  pub const INTERNAL_ERROR: i64 = -32603;
}
