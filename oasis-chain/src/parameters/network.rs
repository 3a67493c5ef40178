//! The set of oasis networks.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An enum describing the possible network choices.
///
/// Selected once at startup; the choice fixes the consensus parameters and
/// checkpoint table for the process lifetime.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// The production mainnet.
    #[default]
    Mainnet,

    /// The public test network.
    Testnet,

    /// The local regression test network.
    Regtest,

    /// The network used by unit tests: regtest parameters with low
    /// activation heights, so every feature era is reachable in a few
    /// blocks.
    UnitTest,
}

/// A magic number identifying the network.
///
/// The message start string is designed to be unlikely to occur in normal
/// data: rarely used upper ASCII, not valid as UTF-8, and a large 4-byte int
/// at any alignment.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Magic(pub [u8; 4]);

impl fmt::Debug for Magic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Magic").field(&hex::encode(self.0)).finish()
    }
}

/// Magic numbers used to identify different oasis networks.
pub mod magics {
    use super::*;
    /// The production mainnet.
    pub const MAINNET: Magic = Magic([0x53, 0x43, 0x39, 0x26]);
    /// The testnet.
    pub const TESTNET: Magic = Magic([0xb3, 0x76, 0x66, 0xca]);
    /// The regression test network.
    pub const REGTEST: Magic = Magic([0xa1, 0xcf, 0x7e, 0xac]);
    /// The unit test network.
    pub const UNIT_TEST: Magic = Magic([0xa1, 0xcf, 0x7e, 0xad]);
}

impl From<Network> for &'static str {
    fn from(network: Network) -> &'static str {
        match network {
            Network::Mainnet => "Mainnet",
            Network::Testnet => "Testnet",
            Network::Regtest => "Regtest",
            Network::UnitTest => "UnitTest",
        }
    }
}

impl From<&Network> for &'static str {
    fn from(network: &Network) -> &'static str {
        (*network).into()
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.into())
    }
}

impl Network {
    /// Returns an iterator over [`Network`] variants.
    pub fn iter() -> impl Iterator<Item = Self> {
        [
            Self::Mainnet,
            Self::Testnet,
            Self::Regtest,
            Self::UnitTest,
        ]
        .into_iter()
    }

    /// Get the default peer-to-peer port associated to this network.
    pub fn default_port(&self) -> u16 {
        match self {
            Network::Mainnet => 2358,
            Network::Testnet => 46005,
            Network::Regtest => 51476,
            Network::UnitTest => 51478,
        }
    }

    /// Get the magic value associated to this network.
    pub fn magic(&self) -> Magic {
        match self {
            Network::Mainnet => magics::MAINNET,
            Network::Testnet => magics::TESTNET,
            Network::Regtest => magics::REGTEST,
            Network::UnitTest => magics::UNIT_TEST,
        }
    }

    /// Return the lowercase network name, as used in config files and data
    /// directory names.
    pub fn lowercase_name(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }

    /// Returns `true` if this network is a testing network.
    pub fn is_a_test_network(&self) -> bool {
        *self != Network::Mainnet
    }
}

impl FromStr for Network {
    type Err = InvalidNetworkError;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        match string.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            "unittest" => Ok(Network::UnitTest),
            _ => Err(InvalidNetworkError(string.to_owned())),
        }
    }
}

/// An error indicating a network name failed to parse.
#[derive(Clone, Debug, Error)]
#[error("Invalid network: {0}")]
pub struct InvalidNetworkError(String);
