use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use bitcoin::NetworkKind;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Network {
    #[serde(rename = "mainnet")]
    Mainnet,
    #[default]
    #[serde(rename = "testnet")]
    Testnet,
    #[serde(rename = "regtest")]
    Regtest,
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Regtest => write!(f, "regtest"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err("Invalid network".to_string()),
        }
    }
}

impl Network {
    /// Version byte prefixed to pay-to-pubkey-hash address payloads.
    pub fn p2pkh_prefix(self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet | Network::Regtest => 0x6f,
        }
    }

    /// Default protocol fee-collection address on this network.
    pub fn default_fee_address(self) -> &'static str {
        match self {
            Network::Mainnet => "1MiHBVygmVHLch8sDQmfiDvwg3zXHFG4dy",
            Network::Testnet | Network::Regtest => "n2EEUZ4faWibPocUvyk3Y99GY3bEFL3jhG",
        }
    }
}

impl From<Network> for NetworkKind {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => NetworkKind::Main,
            _ => NetworkKind::Test,
        }
    }
}
