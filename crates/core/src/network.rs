use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Bitcoin network a wallet daemon runs against.
///
/// Mainnet is written `bitcoin` on disk and on the wire, matching the
/// daemon's own configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Network {
  #[default]
  Mainnet,
  Testnet,
  Signet,
  Regtest,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown network `{0}` (expected bitcoin, mainnet, testnet, signet or regtest)")]
pub struct ParseNetworkError(pub String);

impl Network {
  pub const ALL: [Network; 4] = [
    Network::Mainnet,
    Network::Testnet,
    Network::Signet,
    Network::Regtest,
  ];

  /// Name used for the per-network directory and in daemon configs.
  pub fn dir_name(self) -> &'static str {
    match self {
      Network::Mainnet => "bitcoin",
      Network::Testnet => "testnet",
      Network::Signet => "signet",
      Network::Regtest => "regtest",
    }
  }

  /// Human label, as shown by the CLI.
  pub fn label(self) -> &'static str {
    match self {
      Network::Mainnet => "mainnet",
      Network::Testnet => "testnet",
      Network::Signet => "signet",
      Network::Regtest => "regtest",
    }
  }
}

impl fmt::Display for Network {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.dir_name())
  }
}

impl FromStr for Network {
  type Err = ParseNetworkError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "bitcoin" | "mainnet" => Ok(Network::Mainnet),
      "testnet" => Ok(Network::Testnet),
      "signet" => Ok(Network::Signet),
      "regtest" => Ok(Network::Regtest),
      _ => Err(ParseNetworkError(s.to_string())),
    }
  }
}

impl Serialize for Network {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.dir_name())
  }
}

impl<'de> Deserialize<'de> for Network {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn mainnet_is_default_and_named_bitcoin_on_disk() {
    assert_eq!(Network::default(), Network::Mainnet);
    assert_eq!(Network::Mainnet.to_string(), "bitcoin");
    assert_eq!(Network::Mainnet.label(), "mainnet");
  }

  #[test]
  fn parses_both_mainnet_spellings() {
    assert_eq!("bitcoin".parse::<Network>(), Ok(Network::Mainnet));
    assert_eq!("Mainnet".parse::<Network>(), Ok(Network::Mainnet));
    assert!("liquid".parse::<Network>().is_err());
  }

  #[test]
  fn serde_uses_dir_names() {
    #[derive(Serialize, Deserialize)]
    struct Wrap {
      network: Network,
    }
    let s = toml::to_string(&Wrap {
      network: Network::Signet,
    })
    .unwrap();
    assert_eq!(s.trim(), "network = \"signet\"");
    let w: Wrap = toml::from_str("network = \"bitcoin\"").unwrap();
    assert_eq!(w.network, Network::Mainnet);
  }

  proptest! {
    #[test]
    fn display_parses_back(idx in 0usize..4) {
      let net = Network::ALL[idx];
      prop_assert_eq!(net.to_string().parse::<Network>().unwrap(), net);
      prop_assert_eq!(net.label().parse::<Network>().unwrap(), net);
    }
  }
}
