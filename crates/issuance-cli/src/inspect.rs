use bitcoin::key::Secp256k1;
use issuance::{IssuanceConfig, ValidAddress, decode_transaction, validate_address};
use serde_json::json;

use crate::issue::parse_key;

pub fn handle_validate_address(config: &IssuanceConfig, address: &str) -> anyhow::Result<()> {
    let valid = validate_address(address, config.network)?;
    println!(
        "{} is a valid {} address for pubkey hash {}",
        address, valid.network, valid.pubkey_hash
    );
    Ok(())
}

pub fn handle_address(config: &IssuanceConfig, key: &str) -> anyhow::Result<()> {
    let key = parse_key(key)?;
    let address = ValidAddress::from_public_key(&key.public_key(&Secp256k1::new()), config.network);
    println!("{address}");
    Ok(())
}

pub fn handle_decode(config: &IssuanceConfig, hex: &str) -> anyhow::Result<()> {
    let signed = decode_transaction(hex)?;
    let outputs: Vec<_> = signed
        .token_outputs()
        .into_iter()
        .map(|output| {
            json!({
                "vout": output.vout,
                "satoshis": output.satoshis,
                "owner": ValidAddress::from_pubkey_hash(output.data.owner, config.network).to_string(),
                "issuer": output.data.issuer.to_string(),
                "symbol": output.data.symbol,
                "amount": output.data.amount,
                "metadata": hex::encode(&output.data.metadata),
            })
        })
        .collect();
    let summary = json!({
        "txid": signed.txid,
        "inputs": signed.transaction.input.len(),
        "outputs": signed.transaction.output.len(),
        "tokenTotal": signed.token_total()?,
        "tokens": outputs,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
