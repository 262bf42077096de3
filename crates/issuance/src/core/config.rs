use serde::{Deserialize, Serialize};

use crate::Network;

/// Economic constants of an issuance. Threaded explicitly through every
/// validation and value computation instead of being read from ambient state.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct IssuanceConfig {
    pub network: Network,
    /// Satoshis locked in a token output per token unit.
    pub satoshis_per_token: u64,
    pub split_output_satoshis: u64,
    pub fee_output_satoshis: u64,
    /// Protocol fee-collection address, validated against `network`.
    /// Falls back to the network's default collector when unset.
    pub fee_address: Option<String>,
    /// Miner fee in satoshis per 1000 bytes.
    pub fee_rate: u64,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self::new(Network::Testnet)
    }
}

impl IssuanceConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            satoshis_per_token: 1,
            split_output_satoshis: 1,
            fee_output_satoshis: 500,
            fee_address: None,
            fee_rate: 500,
        }
    }

    pub fn fee_address(&self) -> &str {
        self.fee_address
            .as_deref()
            .unwrap_or_else(|| self.network.default_fee_address())
    }
}
