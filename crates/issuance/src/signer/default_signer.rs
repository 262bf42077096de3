use bitcoin::{
    ScriptBuf, Transaction, TxOut,
    consensus::encode::serialize,
    hashes::{Hash, sha256d},
    key::Secp256k1,
    script::{Builder, PushBytesBuf},
    secp256k1::{All, Message},
};
use tracing::trace;

use crate::{
    core::constants::SIGHASH_ALL_FORKID,
    signer::{InputSigner, SignInputRequest, SignerError},
};

/// Digest signed for `input_index` under `SIGHASH_ALL | SIGHASH_FORKID`.
///
/// The preimage follows the BIP143 layout: version, hash of all outpoints,
/// hash of all sequences, the spent outpoint, its locking script as script
/// code, its value, the input sequence, hash of all outputs, lock time and
/// the sighash type.
pub fn forkid_sighash(
    transaction: &Transaction,
    input_index: usize,
    prev_output: &TxOut,
) -> Result<sha256d::Hash, SignerError> {
    let input = transaction
        .input
        .get(input_index)
        .ok_or(SignerError::InputIndexOutOfRange(input_index))?;

    let prevouts: Vec<u8> = transaction
        .input
        .iter()
        .flat_map(|txin| serialize(&txin.previous_output))
        .collect();
    let sequences: Vec<u8> = transaction
        .input
        .iter()
        .flat_map(|txin| txin.sequence.0.to_le_bytes())
        .collect();
    let outputs: Vec<u8> = transaction.output.iter().flat_map(serialize).collect();

    let mut preimage = serialize(&transaction.version);
    preimage.extend_from_slice(sha256d::Hash::hash(&prevouts).as_byte_array());
    preimage.extend_from_slice(sha256d::Hash::hash(&sequences).as_byte_array());
    preimage.extend(serialize(&input.previous_output));
    preimage.extend(serialize(&prev_output.script_pubkey));
    preimage.extend_from_slice(&prev_output.value.to_sat().to_le_bytes());
    preimage.extend_from_slice(&input.sequence.0.to_le_bytes());
    preimage.extend_from_slice(sha256d::Hash::hash(&outputs).as_byte_array());
    preimage.extend(serialize(&transaction.lock_time));
    preimage.extend_from_slice(&u32::from(SIGHASH_ALL_FORKID).to_le_bytes());

    Ok(sha256d::Hash::hash(&preimage))
}

/// Signs pay-to-pubkey-hash inputs with deterministic (RFC6979) ECDSA.
#[derive(Clone)]
pub struct DefaultSigner {
    secp: Secp256k1<All>,
}

impl Default for DefaultSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultSigner {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }
}

impl InputSigner for DefaultSigner {
    fn sign_input(&self, request: &SignInputRequest<'_>) -> Result<ScriptBuf, SignerError> {
        let digest = forkid_sighash(
            request.transaction,
            request.input_index,
            request.prev_output,
        )?;
        let message = Message::from_digest(digest.to_byte_array());
        let signature = self
            .secp
            .sign_ecdsa(&message, &request.private_key.inner);

        let mut signature_bytes = signature.serialize_der().to_vec();
        signature_bytes.push(SIGHASH_ALL_FORKID);
        let signature_push = PushBytesBuf::try_from(signature_bytes)
            .map_err(|e| SignerError::SerializationError(e.to_string()))?;

        let public_key = request.private_key.public_key(&self.secp);
        trace!(input = request.input_index, %digest, "Signed input");

        Ok(Builder::new()
            .push_slice(signature_push)
            .push_key(&public_key)
            .into_script())
    }
}
