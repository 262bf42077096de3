use bitcoin::{Amount, PrivateKey, Transaction, TxOut, key::Secp256k1};
use tracing::debug;

use crate::{
    address::ValidAddress,
    assemble::{SignedTransaction, estimate_fee, sign_inputs, unsigned_transaction},
    core::IssuanceConfig,
    error::{IssueError, OverflowError, SchemaError, UtxoError, UtxoRole},
    model::{TokenSchema, Utxo},
    script::{contract_script, parse_contract_script, parse_token_script},
    signer::InputSigner,
};

pub struct ContractRequest<'a> {
    pub issuer_key: &'a PrivateKey,
    /// Outputs owned by the issuer that fund the contract output.
    pub issuer_utxos: &'a [Utxo],
    pub funding_utxo: Option<&'a Utxo>,
    pub funding_key: Option<&'a PrivateKey>,
    pub schema: &'a TokenSchema,
}

/// Builds the contract transaction committing `schema`.
///
/// Output 0 is the contract output carrying the whole supply, output 1 the
/// change, paid to the funding key when one is given and to the issuer
/// otherwise.
pub fn build_contract<S: InputSigner + ?Sized>(
    request: &ContractRequest<'_>,
    config: &IssuanceConfig,
    signer: &S,
) -> Result<SignedTransaction, IssueError> {
    let secp = Secp256k1::new();
    let issuer_public_key = request.issuer_key.public_key(&secp);
    if issuer_public_key.pubkey_hash() != request.schema.issuer_fingerprint {
        return Err(SchemaError::FingerprintMismatch.into());
    }

    let mut spent: Vec<_> = request
        .issuer_utxos
        .iter()
        .map(|utxo| (utxo, request.issuer_key))
        .collect();
    let change_key = match (request.funding_utxo, request.funding_key) {
        (Some(utxo), Some(key)) => {
            spent.push((utxo, key));
            key
        }
        (None, None) => request.issuer_key,
        _ => return Err(UtxoError::new(UtxoRole::Payment).into()),
    };

    let contract_value = request
        .schema
        .total_supply
        .checked_mul(config.satoshis_per_token)
        .ok_or(OverflowError)?;
    let total_in = spent
        .iter()
        .try_fold(0u64, |total, (utxo, _)| total.checked_add(utxo.satoshis))
        .ok_or(OverflowError)?;

    let change_address =
        ValidAddress::from_public_key(&change_key.public_key(&secp), config.network);
    let mut transaction = unsigned_transaction(
        &spent,
        vec![
            TxOut {
                value: Amount::from_sat(contract_value),
                script_pubkey: contract_script(request.schema)?,
            },
            TxOut {
                value: Amount::ZERO,
                script_pubkey: change_address.script_pubkey(),
            },
        ],
    );

    let miner_fee = estimate_fee(&transaction, config.fee_rate)?;
    let needed = contract_value.checked_add(miner_fee).ok_or(OverflowError)?;
    let change = total_in
        .checked_sub(needed)
        .ok_or(IssueError::InsufficientFunds {
            needed,
            available: total_in,
        })?;

    if change == 0 {
        transaction.output.pop();
    } else if let Some(change_output) = transaction.output.last_mut() {
        change_output.value = Amount::from_sat(change);
    }

    sign_inputs(&mut transaction, &spent, signer)?;
    let signed = SignedTransaction::new(transaction);
    debug!(
        txid = %signed.txid,
        symbol = %request.schema.symbol,
        supply = request.schema.total_supply,
        contract_value,
        miner_fee,
        change,
        "Built contract transaction"
    );
    Ok(signed)
}

/// Describes output `vout` of `transaction` as a spendable [`Utxo`], reading
/// the token amount from contract and token scripts.
pub fn utxo_from_transaction(transaction: &Transaction, vout: u32) -> Result<Utxo, IssueError> {
    let txid = transaction.compute_txid();
    let output = usize::try_from(vout)
        .ok()
        .and_then(|index| transaction.output.get(index))
        .ok_or(IssueError::OutputNotFound { txid, vout })?;

    let token_amount = parse_contract_script(&output.script_pubkey)
        .map(|schema| schema.total_supply)
        .or_else(|| parse_token_script(&output.script_pubkey).map(|data| data.amount));

    Ok(Utxo {
        txid,
        vout,
        satoshis: output.value.to_sat(),
        script_pubkey: output.script_pubkey.clone(),
        token_amount,
    })
}

#[cfg(test)]
mod tests {
    use bitcoin::hashes::Hash;

    use super::*;
    use crate::{
        Network,
        model::parse_schema,
        signer::DefaultSigner,
        test_utils::{faucet_utxo, test_key},
    };

    fn schema_for(key: &PrivateKey, supply: i64) -> TokenSchema {
        let hash = key.public_key(&Secp256k1::new()).pubkey_hash();
        parse_schema(hash.as_byte_array(), "TAALT", supply).unwrap()
    }

    #[test]
    fn test_contract_outputs() {
        let config = IssuanceConfig::default();
        let issuer = test_key(1);
        let funding = test_key(2);
        let issuer_utxos = vec![faucet_utxo(&issuer, 20_000, 1)];
        let funding_utxo = faucet_utxo(&funding, 10_000, 2);
        let schema = schema_for(&issuer, 10_000);

        let signed = build_contract(
            &ContractRequest {
                issuer_key: &issuer,
                issuer_utxos: &issuer_utxos,
                funding_utxo: Some(&funding_utxo),
                funding_key: Some(&funding),
                schema: &schema,
            },
            &config,
            &DefaultSigner::new(),
        )
        .unwrap();

        let contract = utxo_from_transaction(&signed.transaction, 0).unwrap();
        assert_eq!(contract.satoshis, 10_000);
        assert_eq!(contract.token_amount, Some(10_000));
        assert_eq!(parse_contract_script(&contract.script_pubkey), Some(schema));

        let change = utxo_from_transaction(&signed.transaction, 1).unwrap();
        assert_eq!(change.token_amount, None);
        assert_eq!(
            change.script_pubkey,
            ValidAddress::from_public_key(&funding.public_key(&Secp256k1::new()), Network::Testnet)
                .script_pubkey()
        );
        let miner_fee = 30_000 - 10_000 - change.satoshis;
        assert!(miner_fee > 0);
        assert!(matches!(
            utxo_from_transaction(&signed.transaction, 2),
            Err(IssueError::OutputNotFound { vout: 2, .. })
        ));
    }

    #[test]
    fn test_fingerprint_must_match_issuer() {
        let issuer = test_key(1);
        let schema = schema_for(&test_key(3), 10_000);
        let issuer_utxos = vec![faucet_utxo(&issuer, 20_000, 1)];
        let err = build_contract(
            &ContractRequest {
                issuer_key: &issuer,
                issuer_utxos: &issuer_utxos,
                funding_utxo: None,
                funding_key: None,
                schema: &schema,
            },
            &IssuanceConfig::default(),
            &DefaultSigner::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IssueError::Schema(SchemaError::FingerprintMismatch)
        ));
    }

    #[test]
    fn test_insufficient_funds() {
        let issuer = test_key(1);
        let schema = schema_for(&issuer, 10_000);
        let issuer_utxos = vec![faucet_utxo(&issuer, 10_000, 1)];
        let err = build_contract(
            &ContractRequest {
                issuer_key: &issuer,
                issuer_utxos: &issuer_utxos,
                funding_utxo: None,
                funding_key: None,
                schema: &schema,
            },
            &IssuanceConfig::default(),
            &DefaultSigner::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IssueError::InsufficientFunds {
                available: 10_000,
                ..
            }
        ));
    }

    #[test]
    fn test_funding_key_without_utxo() {
        let issuer = test_key(1);
        let funding = test_key(2);
        let schema = schema_for(&issuer, 10_000);
        let issuer_utxos = vec![faucet_utxo(&issuer, 20_000, 1)];
        let err = build_contract(
            &ContractRequest {
                issuer_key: &issuer,
                issuer_utxos: &issuer_utxos,
                funding_utxo: None,
                funding_key: Some(&funding),
                schema: &schema,
            },
            &IssuanceConfig::default(),
            &DefaultSigner::new(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "paymentUtxo is invalid");
    }
}
