use bitcoin::{
    NetworkKind, PrivateKey, ScriptBuf, Transaction, Txid,
    hashes::{Hash, sha256d},
    key::Secp256k1,
};

use crate::{
    Network,
    address::ValidAddress,
    contract::{ContractRequest, build_contract, utxo_from_transaction},
    core::IssuanceConfig,
    model::{TokenSchema, Utxo, parse_schema},
    signer::DefaultSigner,
};

pub const FUNDING_SATOSHIS: u64 = 100_000;

/// Deterministic key derived from a non-zero seed byte.
pub fn test_key(seed: u8) -> PrivateKey {
    assert_ne!(seed, 0, "zero is not a valid secret key");
    PrivateKey::from_slice(&[seed; 32], NetworkKind::Test).unwrap()
}

pub fn test_address(seed: u8, network: Network) -> String {
    ValidAddress::from_public_key(&test_key(seed).public_key(&Secp256k1::new()), network)
        .to_string()
}

/// Stand-in for an output received from a faucet: a P2PKH output locked to
/// `key` in a transaction that only exists by its id.
pub fn faucet_utxo(key: &PrivateKey, satoshis: u64, seed: u8) -> Utxo {
    let public_key = key.public_key(&Secp256k1::new());
    Utxo {
        txid: Txid::from_raw_hash(sha256d::Hash::hash(&[seed])),
        vout: 0,
        satoshis,
        script_pubkey: ScriptBuf::new_p2pkh(&public_key.pubkey_hash()),
        token_amount: None,
    }
}

pub struct ContractFixture {
    pub issuer_key: PrivateKey,
    pub funding_key: PrivateKey,
    pub schema: TokenSchema,
    pub transaction: Transaction,
    /// Output 0 of the contract transaction.
    pub contract_utxo: Utxo,
    /// Output 1 of the contract transaction, owned by the funding key.
    pub payment_utxo: Utxo,
}

/// Builds a signed contract transaction for a `TAALT` token of `supply` units.
pub fn contract_fixture(supply: u64, config: &IssuanceConfig) -> ContractFixture {
    let issuer_key = test_key(1);
    let funding_key = test_key(2);
    let issuer_hash = issuer_key.public_key(&Secp256k1::new()).pubkey_hash();
    let schema = parse_schema(
        issuer_hash.as_byte_array(),
        "TAALT",
        i64::try_from(supply).unwrap(),
    )
    .unwrap();

    let contract_value = supply.checked_mul(config.satoshis_per_token).unwrap();
    let issuer_utxos = vec![faucet_utxo(&issuer_key, contract_value, 1)];
    let funding_utxo = faucet_utxo(&funding_key, FUNDING_SATOSHIS, 2);

    let signed = build_contract(
        &ContractRequest {
            issuer_key: &issuer_key,
            issuer_utxos: &issuer_utxos,
            funding_utxo: Some(&funding_utxo),
            funding_key: Some(&funding_key),
            schema: &schema,
        },
        config,
        &DefaultSigner::new(),
    )
    .unwrap();

    let contract_utxo = utxo_from_transaction(&signed.transaction, 0).unwrap();
    let payment_utxo = utxo_from_transaction(&signed.transaction, 1).unwrap();
    ContractFixture {
        issuer_key,
        funding_key,
        schema,
        transaction: signed.transaction,
        contract_utxo,
        payment_utxo,
    }
}
