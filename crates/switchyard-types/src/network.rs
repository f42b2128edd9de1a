//! Network identity types: chain ids, network-client ids, origins and the
//! static table of built-in networks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::SwitchyardError;

/// Numeric chain identifier.
///
/// Parsed from `0x`-prefixed hex or plain decimal; always rendered as
/// lowercase `0x` hex, so `"0x01"`, `"0x1"` and `"1"` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = SwitchyardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|e| SwitchyardError::Serialization(format!("invalid chain id '{s}': {e}")))
    }
}

impl Serialize for ChainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChainId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(ChainId(n)),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a configured network client (e.g. "mainnet" or a UUID).
    NetworkClientId
);

string_id!(
    /// Identity of the calling context issuing a request (e.g. a dapp's domain).
    Origin
);

/// Networks whose chain id is known from static configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltInNetwork {
    Mainnet,
    Goerli,
    Sepolia,
    LineaGoerli,
    LineaSepolia,
    LineaMainnet,
}

impl BuiltInNetwork {
    pub const ALL: [BuiltInNetwork; 6] = [
        BuiltInNetwork::Mainnet,
        BuiltInNetwork::Goerli,
        BuiltInNetwork::Sepolia,
        BuiltInNetwork::LineaGoerli,
        BuiltInNetwork::LineaSepolia,
        BuiltInNetwork::LineaMainnet,
    ];

    /// The network-client identifier naming this network.
    pub const fn client_id(self) -> &'static str {
        match self {
            BuiltInNetwork::Mainnet => "mainnet",
            BuiltInNetwork::Goerli => "goerli",
            BuiltInNetwork::Sepolia => "sepolia",
            BuiltInNetwork::LineaGoerli => "linea-goerli",
            BuiltInNetwork::LineaSepolia => "linea-sepolia",
            BuiltInNetwork::LineaMainnet => "linea-mainnet",
        }
    }

    pub const fn chain_id(self) -> ChainId {
        match self {
            BuiltInNetwork::Mainnet => ChainId(0x1),
            BuiltInNetwork::Goerli => ChainId(0x5),
            BuiltInNetwork::Sepolia => ChainId(0xaa36a7),
            BuiltInNetwork::LineaGoerli => ChainId(0xe704),
            BuiltInNetwork::LineaSepolia => ChainId(0xe705),
            BuiltInNetwork::LineaMainnet => ChainId(0xe708),
        }
    }

    /// Recognise a network-client identifier naming a built-in network.
    pub fn from_client_id(id: &NetworkClientId) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|network| network.client_id() == id.as_str())
    }
}

impl fmt::Display for BuiltInNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.client_id())
    }
}

/// Configuration of a network client as reported by the network directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkClientConfig {
    pub chain_id: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_parses_hex_and_decimal() {
        assert_eq!("0x1".parse::<ChainId>().unwrap(), ChainId(1));
        assert_eq!("0x01".parse::<ChainId>().unwrap(), ChainId(1));
        assert_eq!("0xAA36A7".parse::<ChainId>().unwrap(), ChainId(11155111));
        assert_eq!("5".parse::<ChainId>().unwrap(), ChainId(5));
        assert!("0xzz".parse::<ChainId>().is_err());
        assert!("".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_id_displays_lowercase_hex() {
        assert_eq!(ChainId(1).to_string(), "0x1");
        assert_eq!(ChainId(0xaa36a7).to_string(), "0xaa36a7");
    }

    #[test]
    fn test_chain_id_serde_accepts_string_or_number() {
        let from_text: ChainId = serde_json::from_str("\"0x5\"").unwrap();
        let from_number: ChainId = serde_json::from_str("5").unwrap();
        assert_eq!(from_text, from_number);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"0x5\"");
    }

    #[test]
    fn test_built_in_lookup() {
        assert_eq!(
            BuiltInNetwork::from_client_id(&NetworkClientId::from("goerli")),
            Some(BuiltInNetwork::Goerli)
        );
        assert_eq!(
            BuiltInNetwork::from_client_id(&NetworkClientId::from("linea-mainnet"))
                .map(BuiltInNetwork::chain_id),
            Some(ChainId(0xe708))
        );
        assert_eq!(
            BuiltInNetwork::from_client_id(&NetworkClientId::from("my-custom-rpc")),
            None
        );
    }

    #[test]
    fn test_built_in_client_ids_are_distinct() {
        let mut ids: Vec<_> = BuiltInNetwork::ALL.iter().map(|n| n.client_id()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), BuiltInNetwork::ALL.len());
    }
}
