use serde::{Deserialize, Serialize};

use crate::network::Network;

/// Response type for `getinfo`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetInfoResult {
  pub version: String,
  pub network: Network,
  pub block_height: i32,
  /// Chain synchronization progress in `[0, 1]`
  pub sync: f64,
  pub descriptors: Descriptors,
  #[serde(default)]
  pub rescan_progress: Option<f64>,
  #[serde(default)]
  pub timestamp: u32,
}

impl GetInfoResult {
  pub fn is_synced(&self) -> bool {
    self.sync >= 1.0
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Descriptors {
  pub main: String,
}

/// Response type for `getnewaddress`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetAddressResult {
  pub address: String,
  pub derivation_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coin {
  pub outpoint: String,
  pub amount_sat: u64,
  #[serde(default)]
  pub block_height: Option<i32>,
  pub derivation_index: u32,
  #[serde(default)]
  pub is_change: bool,
  #[serde(default)]
  pub spend_txid: Option<String>,
}

/// Response type for `listcoins`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListCoinsResult {
  pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpendTx {
  pub psbt: String,
  #[serde(default)]
  pub change_index: Option<u32>,
  #[serde(default)]
  pub updated_at: Option<u32>,
}

/// Response type for `listspendtxs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListSpendResult {
  pub spend_txs: Vec<SpendTx>,
}
