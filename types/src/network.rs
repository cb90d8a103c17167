//! Network identifier.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::TypeError;

/// Identifies which Cardano network addresses belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The production network.
    Mainnet,
    /// Any public test network (preprod, preview).
    Testnet,
}

impl Network {
    /// Network id carried in the low nibble of a Shelley address header.
    pub fn id(&self) -> u8 {
        match self {
            Self::Mainnet => 1,
            Self::Testnet => 0,
        }
    }

    /// Bech32 human-readable prefix for reward addresses.
    pub fn reward_hrp(&self) -> &'static str {
        match self {
            Self::Mainnet => "stake",
            Self::Testnet => "stake_test",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl FromStr for Network {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Self::Mainnet),
            "testnet" | "test" | "preprod" | "preview" => Ok(Self::Testnet),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::Mainnet
    }
}
