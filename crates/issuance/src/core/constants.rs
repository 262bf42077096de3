/// Decoded length of a base58check pay-to-pubkey-hash address:
/// version byte, 20 byte hash and 4 byte checksum.
pub const ADDRESS_DECODED_LEN: usize = 25;
pub const ADDRESS_CHECKSUM_LEN: usize = 4;
pub const PUBKEY_HASH_LEN: usize = 20;

/// Largest satoshi amount the ledger can represent.
pub const MAX_SATOSHIS: u64 = 21_000_000 * 100_000_000;

pub const MAX_SYMBOL_LEN: usize = 128;

/// `SIGHASH_ALL | SIGHASH_FORKID`
pub const SIGHASH_ALL_FORKID: u8 = 0x41;

/// Upper bound of a P2PKH unlocking script: push(72 byte sig + type) push(33 byte key).
pub const P2PKH_SCRIPT_SIG_LEN: usize = 1 + 73 + 1 + 33;
