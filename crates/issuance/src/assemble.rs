use bitcoin::{
    Amount, PrivateKey, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
    absolute::LockTime,
    consensus::encode::{deserialize_hex, serialize, serialize_hex},
    transaction::Version,
};
use tracing::{debug, trace};

use crate::{
    core::{IssuanceConfig, constants::P2PKH_SCRIPT_SIG_LEN},
    error::{ArgumentError, IssueError, OverflowError, UtxoError, UtxoRole},
    model::Utxo,
    plan::{IssuancePlan, PlannedOutput},
    script::{TokenOrigin, TokenScriptData, parse_token_script, token_script},
    signer::{InputSigner, SignInputRequest, SignerError},
};

/// Satoshi-funding input and the key that unlocks it.
#[derive(Clone, Copy, Debug)]
pub struct Funding<'a> {
    pub utxo: &'a Utxo,
    pub key: &'a PrivateKey,
}

#[derive(Clone, Copy, Debug)]
pub struct AssembleRequest<'a> {
    pub plan: &'a IssuancePlan,
    pub contract_utxo: &'a Utxo,
    pub issuer_key: &'a PrivateKey,
    pub funding: Option<Funding<'a>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub txid: Txid,
}

/// A token-carrying output of a decoded transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenOutput {
    pub vout: u32,
    pub satoshis: u64,
    pub data: TokenScriptData,
}

impl SignedTransaction {
    pub fn new(transaction: Transaction) -> Self {
        let txid = transaction.compute_txid();
        Self { transaction, txid }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serialize(&self.transaction)
    }

    pub fn to_hex(&self) -> String {
        serialize_hex(&self.transaction)
    }

    pub fn token_outputs(&self) -> Vec<TokenOutput> {
        self.transaction
            .output
            .iter()
            .enumerate()
            .filter_map(|(vout, output)| {
                Some(TokenOutput {
                    vout: u32::try_from(vout).ok()?,
                    satoshis: output.value.to_sat(),
                    data: parse_token_script(&output.script_pubkey)?,
                })
            })
            .collect()
    }

    /// Sum of token units across all token outputs.
    pub fn token_total(&self) -> Result<u64, OverflowError> {
        self.token_outputs()
            .iter()
            .try_fold(0u64, |total, output| total.checked_add(output.data.amount))
            .ok_or(OverflowError)
    }
}

pub fn decode_transaction(hex: &str) -> Result<SignedTransaction, IssueError> {
    let transaction: Transaction =
        deserialize_hex(hex.trim()).map_err(|e| IssueError::Decode(e.to_string()))?;
    Ok(SignedTransaction::new(transaction))
}

/// Converts a plan into a signed transaction.
///
/// Input 0 spends the contract (or prior issuance) output with the issuer key,
/// input 1 the funding output with the funding key. Every output value must be
/// a positive satoshi amount; this is where negative and zero token amounts are
/// rejected.
pub fn assemble<S: InputSigner + ?Sized>(
    request: &AssembleRequest<'_>,
    config: &IssuanceConfig,
    signer: &S,
) -> Result<SignedTransaction, IssueError> {
    let AssembleRequest {
        plan,
        contract_utxo,
        issuer_key,
        funding,
    } = *request;

    let mut spent = vec![(contract_utxo, issuer_key)];
    if let Some(funding) = funding {
        spent.push((funding.utxo, funding.key));
    }

    let mut output = Vec::with_capacity(plan.outputs.len());
    let mut change_script = None;
    let mut token_value = 0u64;
    for planned in &plan.outputs {
        match fixed_output(planned, &plan.origin, config)? {
            Some(tx_out) => {
                if matches!(planned, PlannedOutput::Token { .. }) {
                    token_value = token_value
                        .checked_add(tx_out.value.to_sat())
                        .ok_or(OverflowError)?;
                }
                output.push(tx_out);
            }
            None => change_script = Some(planned.address().script_pubkey()),
        }
    }
    let fixed_total = output
        .iter()
        .try_fold(0u64, |total, tx_out: &TxOut| {
            total.checked_add(tx_out.value.to_sat())
        })
        .ok_or(OverflowError)?;

    // Token outputs carry exactly the consumed output's value; none of it may
    // reach change or the miner.
    if plan.supply_checked && token_value != contract_utxo.satoshis {
        debug!(
            token_value,
            contract_value = contract_utxo.satoshis,
            "contractUtxo rejected: value does not match the token outputs"
        );
        return Err(UtxoError::new(UtxoRole::Contract).into());
    }
    // Token value beyond the consumed output, paid by the funding input.
    // Only unchecked plans get here with a non-zero shortfall.
    let token_shortfall = token_value.saturating_sub(contract_utxo.satoshis);

    let mut transaction = unsigned_transaction(&spent, output);

    match (funding, change_script) {
        (Some(funding), Some(change_script)) => {
            let required = fixed_total
                .checked_sub(token_value)
                .and_then(|rest| rest.checked_add(token_shortfall))
                .ok_or(OverflowError)?;
            add_change(
                &mut transaction,
                funding.utxo,
                change_script,
                required,
                config,
            )?;
        }
        (None, None) => {
            if token_shortfall > 0 {
                return Err(IssueError::InsufficientFunds {
                    needed: fixed_total,
                    available: contract_utxo.satoshis,
                });
            }
        }
        _ => return Err(UtxoError::new(UtxoRole::Payment).into()),
    }

    sign_inputs(&mut transaction, &spent, signer)?;

    let signed = SignedTransaction::new(transaction);
    debug!(
        txid = %signed.txid,
        inputs = signed.transaction.input.len(),
        outputs = signed.transaction.output.len(),
        "Assembled issuance transaction"
    );
    Ok(signed)
}

pub(crate) fn unsigned_transaction(
    spent: &[(&Utxo, &PrivateKey)],
    output: Vec<TxOut>,
) -> Transaction {
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: spent
            .iter()
            .map(|(utxo, _)| TxIn {
                previous_output: utxo.outpoint(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            })
            .collect(),
        output,
    }
}

/// Signs every input of `transaction`, which spends `spent` in order.
pub(crate) fn sign_inputs<S: InputSigner + ?Sized>(
    transaction: &mut Transaction,
    spent: &[(&Utxo, &PrivateKey)],
    signer: &S,
) -> Result<(), SignerError> {
    let script_sigs = spent
        .iter()
        .enumerate()
        .map(|(input_index, &(utxo, private_key))| {
            let prev_output = utxo.tx_out();
            signer.sign_input(&SignInputRequest {
                transaction: &*transaction,
                input_index,
                prev_output: &prev_output,
                private_key,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    for (txin, script_sig) in transaction.input.iter_mut().zip(script_sigs) {
        txin.script_sig = script_sig;
    }
    Ok(())
}

/// Output with a value fixed by the plan, or `None` for the change output.
fn fixed_output(
    planned: &PlannedOutput,
    origin: &TokenOrigin,
    config: &IssuanceConfig,
) -> Result<Option<TxOut>, IssueError> {
    let (value, script_pubkey) = match planned {
        PlannedOutput::Token {
            address,
            amount,
            metadata,
        } => {
            let units = u64::try_from(*amount)
                .ok()
                .filter(|units| *units > 0)
                .ok_or_else(ArgumentError::output_satoshis)?;
            let value = units
                .checked_mul(config.satoshis_per_token)
                .ok_or(OverflowError)?;
            let script = token_script(&TokenScriptData {
                owner: address.pubkey_hash,
                issuer: origin.issuer_fingerprint,
                amount: units,
                symbol: origin.symbol.clone(),
                metadata: metadata.clone(),
            })?;
            (value, script)
        }
        PlannedOutput::Split { address } => {
            (config.split_output_satoshis, address.script_pubkey())
        }
        PlannedOutput::Fee { address } => (config.fee_output_satoshis, address.script_pubkey()),
        PlannedOutput::Change { .. } => return Ok(None),
    };

    if value == 0 {
        return Err(ArgumentError::output_satoshis().into());
    }
    trace!(kind = ?planned.kind(), value, address = %planned.address(), "Output");
    Ok(Some(TxOut {
        value: Amount::from_sat(value),
        script_pubkey,
    }))
}

/// Appends the change output, paying `required` satoshis of fixed outputs
/// and the miner fee from the funding input alone.
fn add_change(
    transaction: &mut Transaction,
    funding_utxo: &Utxo,
    change_script: ScriptBuf,
    required: u64,
    config: &IssuanceConfig,
) -> Result<(), IssueError> {
    // An empty funding record arrives here as a zero-value input.
    if funding_utxo.satoshis == 0 {
        return Err(ArgumentError::output_satoshis().into());
    }

    transaction.output.push(TxOut {
        value: Amount::ZERO,
        script_pubkey: change_script,
    });
    let miner_fee = estimate_fee(transaction, config.fee_rate)?;

    let change = funding_utxo
        .satoshis
        .checked_sub(required)
        .and_then(|rest| rest.checked_sub(miner_fee))
        .ok_or_else(ArgumentError::output_satoshis)?;

    if change == 0 {
        transaction.output.pop();
    } else if let Some(change_output) = transaction.output.last_mut() {
        change_output.value = Amount::from_sat(change);
    }
    debug!(
        funding_in = funding_utxo.satoshis,
        required, miner_fee, change, "Computed change"
    );
    Ok(())
}

/// Miner fee for `transaction` once every input carries a P2PKH unlocking script.
pub(crate) fn estimate_fee(transaction: &Transaction, fee_rate: u64) -> Result<u64, OverflowError> {
    let size = transaction
        .input
        .len()
        .checked_mul(P2PKH_SCRIPT_SIG_LEN)
        .and_then(|script_sigs| script_sigs.checked_add(transaction.base_size()))
        .and_then(|size| u64::try_from(size).ok())
        .ok_or(OverflowError)?;
    size.checked_mul(fee_rate)
        .map(|fee| fee.div_ceil(1000))
        .ok_or(OverflowError)
}
