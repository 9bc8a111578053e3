use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};

use crate::network::Network;
use crate::rpc::codes::{INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
use crate::rpc::{Coin, Descriptors, GetAddressResult, GetInfoResult, ListCoinsResult, ListSpendResult};

/// Response body plus whether the server should shut down after sending it.
#[derive(Debug)]
pub struct Reply {
  pub body: Value,
  pub stop: bool,
}

#[derive(Debug)]
struct WalletState {
  next_index: u32,
  sync: f64,
  block_height: i32,
}

/// In-memory wallet backing the dev daemon.
#[derive(Debug)]
pub struct Wallet {
  network: Network,
  /// Sync progress added per `getinfo`; 1.0 means synced from the start
  sync_step: f64,
  state: Mutex<WalletState>,
}

impl Wallet {
  pub fn new(network: Network, sync_steps: u32) -> Self {
    let (sync, sync_step) = match sync_steps {
      0 => (1.0, 1.0),
      n => (0.0, 1.0 / f64::from(n)),
    };
    Self {
      network,
      sync_step,
      state: Mutex::new(WalletState {
        next_index: 0,
        sync,
        block_height: 120,
      }),
    }
  }

  pub fn handle_line(&self, line: &str) -> Reply {
    let req: Value = match serde_json::from_str(line) {
      Ok(v) => v,
      Err(e) => return error_reply(Value::Null, PARSE_ERROR, &format!("Parse error: {e}")),
    };
    let id = req.get("id").cloned().unwrap_or(Value::Null);
    if let Some(v) = req.get("jsonrpc")
      && v.as_str() != Some("2.0")
    {
      return error_reply(id, INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\"");
    }
    let Some(method) = req.get("method").and_then(Value::as_str) else {
      return error_reply(id, INVALID_REQUEST, "Invalid request: missing method");
    };
    let params = req.get("params");
    if let Some(p) = params
      && !(p.is_object() || p.is_array() || p.is_null())
    {
      return error_reply(id, INVALID_PARAMS, "Invalid params: expected object or array");
    }

    let result = match method {
      "getinfo" => to_result(self.get_info()),
      "getnewaddress" => to_result(self.get_new_address()),
      "listcoins" => to_result(self.list_coins()),
      "listspendtxs" => to_result(ListSpendResult { spend_txs: vec![] }),
      "stop" => {
        return Reply {
          body: json!({ "jsonrpc": "2.0", "id": id, "result": null }),
          stop: true,
        };
      }
      other => return error_reply(id, METHOD_NOT_FOUND, &format!("Method not found: {other}")),
    };
    match result {
      Ok(v) => Reply {
        body: json!({ "jsonrpc": "2.0", "id": id, "result": v }),
        stop: false,
      },
      Err(e) => error_reply(id, INTERNAL_ERROR, &e.to_string()),
    }
  }

  fn get_info(&self) -> GetInfoResult {
    let mut st = self.state.lock();
    let sync = st.sync;
    if st.sync < 1.0 {
      st.sync = (st.sync + self.sync_step).min(1.0);
      st.block_height += 1;
    }
    GetInfoResult {
      version: env!("CARGO_PKG_VERSION").to_string(),
      network: self.network,
      block_height: st.block_height,
      sync,
      descriptors: Descriptors {
        main: "wsh(pk([f00dbabe/48'/1'/0'/2']tpubDevd/<0;1>/*))".to_string(),
      },
      rescan_progress: None,
      timestamp: u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX),
    }
  }

  fn get_new_address(&self) -> GetAddressResult {
    let mut st = self.state.lock();
    let index = st.next_index;
    st.next_index += 1;
    GetAddressResult {
      address: format!("{}1qcoffer{index:08}", hrp(self.network)),
      derivation_index: index,
    }
  }

  fn list_coins(&self) -> ListCoinsResult {
    let st = self.state.lock();
    let coins = (0..st.next_index.min(2))
      .map(|i| Coin {
        outpoint: format!("{:064x}:{i}", 0xc0ffee_u64 + u64::from(i)),
        amount_sat: 50_000 * (u64::from(i) + 1),
        block_height: Some(st.block_height - 6),
        derivation_index: i,
        is_change: false,
        spend_txid: None,
      })
      .collect();
    ListCoinsResult { coins }
  }
}

fn hrp(network: Network) -> &'static str {
  match network {
    Network::Mainnet => "bc",
    Network::Testnet | Network::Signet => "tb",
    Network::Regtest => "bcrt",
  }
}

fn to_result<T: Serialize>(v: T) -> Result<Value, serde_json::Error> {
  serde_json::to_value(v)
}

fn error_reply(id: Value, code: i64, message: &str) -> Reply {
  Reply {
    body: json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } }),
    stop: false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn call(w: &Wallet, method: &str) -> Value {
    w.handle_line(&json!({ "jsonrpc": "2.0", "id": 1, "method": method }).to_string())
      .body
  }

  #[test]
  fn unknown_method_is_method_not_found() {
    let w = Wallet::new(Network::Regtest, 0);
    let body = call(&w, "createspend");
    assert_eq!(body["error"]["code"], METHOD_NOT_FOUND);
    assert_eq!(body["id"], 1);
  }

  #[test]
  fn garbage_is_parse_error_with_null_id() {
    let w = Wallet::new(Network::Regtest, 0);
    let body = w.handle_line("{not json").body;
    assert_eq!(body["error"]["code"], PARSE_ERROR);
    assert!(body["id"].is_null());
  }

  #[test]
  fn scalar_params_are_invalid() {
    let w = Wallet::new(Network::Regtest, 0);
    let body = w
      .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"listcoins","params":3}"#)
      .body;
    assert_eq!(body["error"]["code"], INVALID_PARAMS);
  }

  #[test]
  fn addresses_advance_and_match_network() {
    let w = Wallet::new(Network::Regtest, 0);
    let a: GetAddressResult = serde_json::from_value(call(&w, "getnewaddress")["result"].clone()).unwrap();
    let b: GetAddressResult = serde_json::from_value(call(&w, "getnewaddress")["result"].clone()).unwrap();
    assert!(a.address.starts_with("bcrt1q"));
    assert_eq!(b.derivation_index, a.derivation_index + 1);
    let coins: ListCoinsResult = serde_json::from_value(call(&w, "listcoins")["result"].clone()).unwrap();
    assert_eq!(coins.coins.len(), 2);
  }

  #[test]
  fn sync_progresses_per_getinfo() {
    let w = Wallet::new(Network::Signet, 2);
    let syncs: Vec<f64> = (0..3)
      .map(|_| call(&w, "getinfo")["result"]["sync"].as_f64().unwrap())
      .collect();
    assert_eq!(syncs, vec![0.0, 0.5, 1.0]);
  }

  #[test]
  fn stop_replies_null_and_requests_shutdown() {
    let w = Wallet::new(Network::Mainnet, 0);
    let reply = w.handle_line(r#"{"jsonrpc":"2.0","id":9,"method":"stop"}"#);
    assert!(reply.stop);
    assert!(reply.body["result"].is_null());
    assert!(reply.body.get("result").is_some());
  }
}
