pub mod error;

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use bitcoin::{
    PubkeyHash, PublicKey, ScriptBuf, base58,
    hashes::{Hash, sha256d},
};

pub use error::{AddressError, AddressErrorReason};

use crate::{
    Network,
    core::constants::{ADDRESS_CHECKSUM_LEN, ADDRESS_DECODED_LEN, PUBKEY_HASH_LEN},
};

const ADDRESS_PAYLOAD_LEN: usize = 1 + PUBKEY_HASH_LEN;

/// A pay-to-pubkey-hash address that decoded, checksummed and matched the
/// network it was validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValidAddress {
    pub network: Network,
    pub pubkey_hash: PubkeyHash,
}

impl ValidAddress {
    pub fn from_pubkey_hash(pubkey_hash: PubkeyHash, network: Network) -> Self {
        Self {
            network,
            pubkey_hash,
        }
    }

    pub fn from_public_key(public_key: &PublicKey, network: Network) -> Self {
        Self::from_pubkey_hash(public_key.pubkey_hash(), network)
    }

    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2pkh(&self.pubkey_hash)
    }
}

impl Display for ValidAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut payload = Vec::with_capacity(ADDRESS_PAYLOAD_LEN);
        payload.push(self.network.p2pkh_prefix());
        payload.extend_from_slice(self.pubkey_hash.as_byte_array());
        f.write_str(&base58::encode_check(&payload))
    }
}

/// Validates a base58check P2PKH address for `network`.
///
/// Checks run in a fixed order so each failure has a distinct reason: empty
/// input, base58 alphabet, decoded length, checksum, then version byte.
pub fn validate_address(address: &str, network: Network) -> Result<ValidAddress, AddressError> {
    let fail = |reason| AddressError::new(address, reason);

    if address.is_empty() {
        return Err(fail(AddressErrorReason::Empty));
    }

    let decoded =
        base58::decode(address).map_err(|_| fail(AddressErrorReason::InvalidEncoding))?;

    match decoded.len().cmp(&ADDRESS_DECODED_LEN) {
        Ordering::Less => return Err(fail(AddressErrorReason::TooShort)),
        Ordering::Greater => return Err(fail(AddressErrorReason::TooLong)),
        Ordering::Equal => {}
    }

    let (payload, checksum) = decoded.split_at(ADDRESS_PAYLOAD_LEN);
    let digest = sha256d::Hash::hash(payload);
    if digest.as_byte_array().get(..ADDRESS_CHECKSUM_LEN) != Some(checksum) {
        return Err(fail(AddressErrorReason::BadChecksum));
    }

    let Some((&version, hash)) = payload.split_first() else {
        return Err(fail(AddressErrorReason::TooShort));
    };
    if version != network.p2pkh_prefix() {
        return Err(fail(AddressErrorReason::WrongNetwork));
    }

    let hash: [u8; PUBKEY_HASH_LEN] = hash
        .try_into()
        .map_err(|_| fail(AddressErrorReason::TooShort))?;

    Ok(ValidAddress::from_pubkey_hash(
        PubkeyHash::from_byte_array(hash),
        network,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAINNET_ADDRESS: &str = "16L5yRNPTuciSgXGHqYwn9N6NeoKqopAu";
    const TESTNET_ADDRESS: &str = "mfcHP2WMCVLsVZA8yrovmhMgxNFW9r98xw";

    fn expected_hash() -> PubkeyHash {
        let mut hash = [0u8; 20];
        for (i, byte) in hash.iter_mut().enumerate() {
            *byte = u8::try_from(i + 1).unwrap();
        }
        PubkeyHash::from_byte_array(hash)
    }

    fn reason(address: &str, network: Network) -> AddressErrorReason {
        validate_address(address, network).unwrap_err().reason
    }

    #[test]
    fn test_valid_addresses() {
        let mainnet = validate_address(MAINNET_ADDRESS, Network::Mainnet).unwrap();
        assert_eq!(mainnet.pubkey_hash, expected_hash());
        assert_eq!(mainnet.to_string(), MAINNET_ADDRESS);

        let testnet = validate_address(TESTNET_ADDRESS, Network::Testnet).unwrap();
        assert_eq!(testnet.pubkey_hash, expected_hash());
        assert_eq!(testnet.to_string(), TESTNET_ADDRESS);

        assert!(validate_address(TESTNET_ADDRESS, Network::Regtest).is_ok());
    }

    #[test]
    fn test_distinct_failure_reasons() {
        assert_eq!(reason("", Network::Testnet), AddressErrorReason::Empty);
        assert_eq!(
            reason("0OIl", Network::Testnet),
            AddressErrorReason::InvalidEncoding
        );
        assert_eq!(
            reason("1bc1qxy2kgdygjrsqtzq2", Network::Testnet),
            AddressErrorReason::TooShort
        );
        assert_eq!(
            reason("1zP1eP5QGefi2DMPTfTL5SLmv7DivfNabc1qxymv7", Network::Testnet),
            AddressErrorReason::TooLong
        );
        assert_eq!(
            reason("16L5yRNPTuciSgXGHqYwn9N6NeoKqopAv", Network::Mainnet),
            AddressErrorReason::BadChecksum
        );
        assert_eq!(
            reason("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", Network::Testnet),
            AddressErrorReason::WrongNetwork
        );
        assert_eq!(
            reason(TESTNET_ADDRESS, Network::Mainnet),
            AddressErrorReason::WrongNetwork
        );
    }

    #[test]
    fn test_error_message() {
        let err = validate_address("1bc1qxy2kgdygjrsqtzq2", Network::Testnet).unwrap_err();
        assert_eq!(err.to_string(), "Invalid Address string provided: too short");
        assert_eq!(err.address, "1bc1qxy2kgdygjrsqtzq2");
    }

    #[test]
    fn test_script_pubkey_is_p2pkh() {
        let address = validate_address(TESTNET_ADDRESS, Network::Testnet).unwrap();
        let script = address.script_pubkey();
        assert!(script.is_p2pkh());
        assert_eq!(script.as_bytes().get(3..23), Some(expected_hash().as_byte_array().as_slice()));
    }
}
