mod default_signer;
mod error;

use bitcoin::{PrivateKey, ScriptBuf, Transaction, TxOut};

pub use default_signer::{DefaultSigner, forkid_sighash};
pub use error::SignerError;

/// One input to unlock. `prev_output` is the output being spent, which the
/// fork-id digest commits to.
pub struct SignInputRequest<'a> {
    pub transaction: &'a Transaction,
    pub input_index: usize,
    pub prev_output: &'a TxOut,
    pub private_key: &'a PrivateKey,
}

pub trait InputSigner: Send + Sync {
    /// Returns the unlocking script for the requested input.
    fn sign_input(&self, request: &SignInputRequest<'_>) -> Result<ScriptBuf, SignerError>;
}
