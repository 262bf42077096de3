use std::fmt::{Display, Formatter};

use bitcoin::Txid;
use thiserror::Error;

use crate::{address::AddressError, model::TokenAmount, signer::SignerError};

pub const OUTPUT_SATOSHIS_NOT_NATURAL: &str = "Output satoshis is not a natural number";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid schema: issuer fingerprint must be 20 bytes, got {0}")]
    InvalidFingerprint(usize),
    #[error("invalid schema: symbol {0:?} must be 1 to 128 alphanumeric characters")]
    InvalidSymbol(String),
    #[error("invalid schema: total supply {0} is not a positive satoshi amount")]
    InvalidSupply(i64),
    #[error("invalid schema: issuer fingerprint does not match the issuer key")]
    FingerprintMismatch,
    #[error("invalid schema: {0}")]
    Malformed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UtxoRole {
    Contract,
    Payment,
}

impl Display for UtxoRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UtxoRole::Contract => write!(f, "contractUtxo"),
            UtxoRole::Payment => write!(f, "paymentUtxo"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{role} is invalid")]
pub struct UtxoError {
    pub role: UtxoRole,
}

impl UtxoError {
    pub fn new(role: UtxoRole) -> Self {
        Self { role }
    }
}

/// Structural rejection of the issuance request. The message is fixed; `reason`
/// only feeds logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("issueInfo is invalid")]
pub struct InstructionError {
    pub reason: String,
}

impl InstructionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("total out amount {requested} must equal total in amount {available}")]
pub struct BalanceError {
    pub requested: TokenAmount,
    pub available: TokenAmount,
}

/// Value-range failure raised while output values are computed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid Argument: {field}")]
pub struct ArgumentError {
    pub field: String,
}

impl ArgumentError {
    pub fn output_satoshis() -> Self {
        Self {
            field: OUTPUT_SATOSHIS_NOT_NATURAL.to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("token amount overflow")]
pub struct OverflowError;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Utxo(#[from] UtxoError),

    #[error(transparent)]
    Instruction(#[from] InstructionError),

    #[error(transparent)]
    Balance(#[from] BalanceError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Overflow(#[from] OverflowError),

    #[error("signing error: {0}")]
    Signer(#[from] SignerError),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("output {vout} not found in transaction {txid}")]
    OutputNotFound { txid: Txid, vout: u32 },

    #[error("transaction decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_messages() {
        assert_eq!(
            IssueError::from(UtxoError::new(UtxoRole::Contract)).to_string(),
            "contractUtxo is invalid"
        );
        assert_eq!(
            UtxoError::new(UtxoRole::Payment).to_string(),
            "paymentUtxo is invalid"
        );
        assert_eq!(
            IssueError::from(InstructionError::new("empty")).to_string(),
            "issueInfo is invalid"
        );
        assert_eq!(
            IssueError::from(BalanceError {
                requested: 13000,
                available: 10000
            })
            .to_string(),
            "total out amount 13000 must equal total in amount 10000"
        );
        assert_eq!(
            IssueError::from(ArgumentError::output_satoshis()).to_string(),
            "Invalid Argument: Output satoshis is not a natural number"
        );
    }
}
