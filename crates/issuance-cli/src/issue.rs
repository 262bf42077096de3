use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use bitcoin::{PrivateKey, hashes::Hash, key::Secp256k1};
use issuance::{
    ContractRequest, IssueRequest, Issuer, SignedTransaction, Utxo, ValidAddress,
    error::UtxoRole,
    parse_schema, utxo_from_transaction,
    validation::{validate_funding_utxo, validate_instructions, validate_utxo},
};
use serde_json::{Value, json};
use tracing::debug;

use crate::command::{ContractArgs, IssueArgs};

pub(crate) fn read_json(path: &Path) -> anyhow::Result<Value> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

pub(crate) fn parse_key(wif: &str) -> anyhow::Result<PrivateKey> {
    PrivateKey::from_wif(wif.trim()).context("invalid WIF key")
}

pub fn handle_contract(issuer: &Issuer, args: ContractArgs) -> anyhow::Result<()> {
    let issuer_key = parse_key(&args.issuer_key)?;
    let issuer_utxos: Vec<Utxo> = serde_json::from_value(read_json(&args.utxos)?)?;
    let funding_utxo = match args.funding_utxo.as_deref() {
        Some(path) => Some(validate_utxo(&read_json(path)?, UtxoRole::Payment)?),
        None => None,
    };
    let funding_key = args.funding_key.as_deref().map(parse_key).transpose()?;

    let fingerprint = issuer_key.public_key(&Secp256k1::new()).pubkey_hash();
    let schema = parse_schema(fingerprint.as_byte_array(), &args.symbol, args.supply)?;
    debug!(symbol = %schema.symbol, supply = schema.total_supply, "Building contract");

    let signed = issuer.contract(&ContractRequest {
        issuer_key: &issuer_key,
        issuer_utxos: &issuer_utxos,
        funding_utxo: funding_utxo.as_ref(),
        funding_key: funding_key.as_ref(),
        schema: &schema,
    })?;
    let contract_utxo = utxo_from_transaction(&signed.transaction, 0)?;
    print_result(&signed, json!({ "contractUtxo": contract_utxo }))
}

pub fn handle_issue(issuer: &Issuer, args: IssueArgs) -> anyhow::Result<()> {
    let issuer_key = parse_key(&args.issuer_key)?;
    let instructions = validate_instructions(&read_json(&args.instructions)?)?;
    let contract_utxo = validate_utxo(&read_json(&args.contract_utxo)?, UtxoRole::Contract)?;
    let funding_utxo = match args.funding_utxo.as_deref() {
        Some(path) => validate_funding_utxo(&read_json(path)?)?,
        None => None,
    };
    let funding_key = args.funding_key.as_deref().map(parse_key).transpose()?;

    let request = IssueRequest {
        issuer_key: &issuer_key,
        instructions: &instructions,
        contract_utxo: &contract_utxo,
        funding_utxo: funding_utxo.as_ref(),
        funding_key: funding_key.as_ref(),
        split: args.split,
        fee_count: args.fee_count,
    };
    let signed = if args.unchecked {
        issuer.issue_unchecked(&request)?
    } else {
        issuer.issue(&request)?
    };

    let network = issuer.config().network;
    let tokens: Vec<_> = signed
        .token_outputs()
        .into_iter()
        .map(|output| {
            json!({
                "vout": output.vout,
                "addr": ValidAddress::from_pubkey_hash(output.data.owner, network).to_string(),
                "amount": output.data.amount,
            })
        })
        .collect();
    print_result(&signed, json!({ "tokens": tokens }))
}

fn print_result(signed: &SignedTransaction, mut extra: Value) -> anyhow::Result<()> {
    if let Value::Object(fields) = &mut extra {
        fields.insert("txid".to_string(), json!(signed.txid));
        fields.insert("hex".to_string(), json!(signed.to_hex()));
    }
    println!("{}", serde_json::to_string_pretty(&extra)?);
    Ok(())
}
