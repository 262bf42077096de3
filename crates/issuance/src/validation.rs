//! Structural checks on caller-supplied records before any planning happens.
//!
//! Value-range checks (sign and magnitude of amounts) are deferred to
//! [`crate::assemble`], where output values are computed.

use bitcoin::{ScriptBuf, Txid, hashes::Hash};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{InstructionError, UtxoError, UtxoRole},
    model::{IssueInstruction, Utxo},
};

fn is_empty_record(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Validates a single UTXO record for the given role.
pub fn validate_utxo(value: &Value, role: UtxoRole) -> Result<Utxo, UtxoError> {
    let Value::Object(map) = value else {
        debug!("{role} rejected: not a record");
        return Err(UtxoError::new(role));
    };
    if map.is_empty() {
        debug!("{role} rejected: empty record");
        return Err(UtxoError::new(role));
    }

    Utxo::deserialize(value).map_err(|e| {
        debug!("{role} rejected: {e}");
        UtxoError::new(role)
    })
}

/// Validates the optional funding record.
///
/// `null` means no funding. An empty record is accepted as a zero-value
/// funding input that the assembler later rejects on value grounds; any other
/// malformed record is a `paymentUtxo` error.
pub fn validate_funding_utxo(value: &Value) -> Result<Option<Utxo>, UtxoError> {
    if value.is_null() {
        return Ok(None);
    }
    if is_empty_record(value) {
        debug!("empty paymentUtxo record, funding with a zero-value input");
        return Ok(Some(empty_funding_utxo()));
    }
    validate_utxo(value, UtxoRole::Payment).map(Some)
}

fn empty_funding_utxo() -> Utxo {
    Utxo {
        txid: Txid::all_zeros(),
        vout: 0,
        satoshis: 0,
        script_pubkey: ScriptBuf::new(),
        token_amount: None,
    }
}

/// Validates the issuance request: a non-empty sequence of `{addr, satoshis, data}`
/// records. A bare record in place of the sequence is rejected.
pub fn validate_instructions(value: &Value) -> Result<Vec<IssueInstruction>, InstructionError> {
    let Value::Array(items) = value else {
        return Err(InstructionError::new("expected a sequence of instructions"));
    };

    let instructions = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            IssueInstruction::deserialize(item)
                .map_err(|e| InstructionError::new(format!("instruction {index}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    ensure_instructions(&instructions)?;
    Ok(instructions)
}

/// Typed counterpart of [`validate_instructions`] for callers that already hold
/// [`IssueInstruction`] values.
pub fn ensure_instructions(instructions: &[IssueInstruction]) -> Result<(), InstructionError> {
    if instructions.is_empty() {
        return Err(InstructionError::new("no instructions"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TXID: &str = "2bd0f9ee3a1e5ae2c2d3e6e7ea7b7d46a6e9e7e5c0e2f1a5b8b6e9f6a3b0c1d2";

    fn utxo_record() -> Value {
        json!({
            "txid": TXID,
            "vout": 1,
            "satoshis": 5000,
            "scriptPubKey": "76a914000000000000000000000000000000000000000088ac",
        })
    }

    #[test]
    fn test_validate_utxo() {
        let utxo = validate_utxo(&utxo_record(), UtxoRole::Contract).unwrap();
        assert_eq!(utxo.vout, 1);
        assert_eq!(utxo.satoshis, 5000);
        assert!(utxo.script_pubkey.is_p2pkh());
        assert_eq!(utxo.token_amount, None);
    }

    #[test]
    fn test_validate_utxo_rejections() {
        let mut negative = utxo_record();
        negative["satoshis"] = json!(-1);
        let mut missing = utxo_record();
        missing.as_object_mut().unwrap().remove("txid");
        let mut fractional = utxo_record();
        fractional["satoshis"] = json!(1.5);

        for value in [
            json!({}),
            json!([]),
            json!([utxo_record()]),
            json!(null),
            json!("utxo"),
            negative,
            missing,
            fractional,
        ] {
            let err = validate_utxo(&value, UtxoRole::Contract).unwrap_err();
            assert_eq!(err.to_string(), "contractUtxo is invalid");
        }
        let err = validate_utxo(&json!({}), UtxoRole::Payment).unwrap_err();
        assert_eq!(err.to_string(), "paymentUtxo is invalid");
    }

    #[test]
    fn test_validate_funding_utxo() {
        assert_eq!(validate_funding_utxo(&Value::Null), Ok(None));

        let placeholder = validate_funding_utxo(&json!({})).unwrap().unwrap();
        assert_eq!(placeholder.satoshis, 0);
        assert_eq!(
            validate_funding_utxo(&json!([])).unwrap(),
            Some(placeholder)
        );

        assert_eq!(
            validate_funding_utxo(&json!({"txid": "zz"})),
            Err(UtxoError::new(UtxoRole::Payment))
        );
        assert!(validate_funding_utxo(&utxo_record()).unwrap().is_some());
    }

    #[test]
    fn test_validate_instructions() {
        let instructions = validate_instructions(&json!([
            {"addr": "a", "satoshis": 7000, "data": "One"},
            {"addr": "b", "satoshis": -3000, "data": "Two"},
        ]))
        .unwrap();
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[1].amount, -3000);
        assert_eq!(instructions[0].metadata, b"One");
    }

    #[test]
    fn test_validate_instructions_rejections() {
        for value in [
            json!([]),
            json!({"addr": "a", "satoshis": 7000, "data": "One"}),
            json!(null),
            json!([{"addr": "a", "satoshis": 7000}]),
            json!([{"addr": "a", "satoshis": "7000", "data": "One"}]),
            json!([{"addr": "a", "satoshis": 1.5, "data": "One"}]),
            json!([{"addr": "a", "satoshis": 1, "data": "One", "memo": "x"}]),
        ] {
            let err = validate_instructions(&value).unwrap_err();
            assert_eq!(err.to_string(), "issueInfo is invalid");
        }
    }
}
