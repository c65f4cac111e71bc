//! Stacks network selector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{STACKS_API_MAINNET, STACKS_API_TESTNET};
use crate::error::X402Error;

/// The Stacks network a payment is expected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// Address version prefixes valid on this network (`SP`/`SM` mainnet, `ST`/`SN` testnet).
    pub fn address_prefixes(&self) -> &'static [&'static str] {
        match self {
            Network::Mainnet => &["SP", "SM"],
            Network::Testnet => &["ST", "SN"],
        }
    }

    /// Default public node API for transaction lookups.
    pub fn default_stacks_api(&self) -> &'static str {
        match self {
            Network::Mainnet => STACKS_API_MAINNET,
            Network::Testnet => STACKS_API_TESTNET,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = X402Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(X402Error::ConfigError(format!(
                "unknown network '{other}' (expected mainnet or testnet)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!(" Testnet ".parse::<Network>().unwrap(), Network::Testnet);
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Network::Mainnet).unwrap(),
            "\"mainnet\""
        );
        assert_eq!(Network::default(), Network::Testnet);
    }
}
