use bitcoin::{Amount, OutPoint, PubkeyHash, ScriptBuf, TxOut, Txid, hashes::Hash};
use serde::{Deserialize, Serialize};

use crate::{
    core::constants::{MAX_SATOSHIS, MAX_SYMBOL_LEN, PUBKEY_HASH_LEN},
    error::{OverflowError, SchemaError},
};

/// Count of token units. Signed so that a negative instruction survives
/// structural validation and is rejected where output values are computed.
pub type TokenAmount = i64;

/// Schema committed by a contract transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSchema {
    pub issuer_fingerprint: PubkeyHash,
    pub symbol: String,
    pub total_supply: u64,
}

impl TokenSchema {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, SchemaError> {
        serde_json::to_vec(self).map_err(|e| SchemaError::Malformed(e.to_string()))
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, SchemaError> {
        let schema: TokenSchema =
            serde_json::from_slice(bytes).map_err(|e| SchemaError::Malformed(e.to_string()))?;
        let supply = i64::try_from(schema.total_supply)
            .map_err(|_| SchemaError::InvalidSupply(i64::MAX))?;
        parse_schema(
            schema.issuer_fingerprint.as_byte_array(),
            &schema.symbol,
            supply,
        )
    }
}

pub fn parse_schema(
    issuer_fingerprint: &[u8],
    symbol: &str,
    total_supply: i64,
) -> Result<TokenSchema, SchemaError> {
    let fingerprint: [u8; PUBKEY_HASH_LEN] = issuer_fingerprint
        .try_into()
        .map_err(|_| SchemaError::InvalidFingerprint(issuer_fingerprint.len()))?;

    if symbol.is_empty()
        || symbol.len() > MAX_SYMBOL_LEN
        || !symbol.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(SchemaError::InvalidSymbol(symbol.to_string()));
    }

    let total_supply = u64::try_from(total_supply)
        .ok()
        .filter(|supply| (1..=MAX_SATOSHIS).contains(supply))
        .ok_or(SchemaError::InvalidSupply(total_supply))?;

    Ok(TokenSchema {
        issuer_fingerprint: PubkeyHash::from_byte_array(fingerprint),
        symbol: symbol.to_string(),
        total_supply,
    })
}

/// One recipient of an issuance. The wire record is `{addr, satoshis, data}`
/// with every field required.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueInstruction {
    #[serde(rename = "addr")]
    pub recipient_address: String,
    #[serde(rename = "satoshis")]
    pub amount: TokenAmount,
    #[serde(rename = "data", with = "metadata_text")]
    pub metadata: Vec<u8>,
}

impl IssueInstruction {
    pub fn new(
        recipient_address: impl Into<String>,
        amount: TokenAmount,
        metadata: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            recipient_address: recipient_address.into(),
            amount,
            metadata: metadata.into(),
        }
    }
}

/// The `data` field travels as text. Metadata that is not UTF-8 fails to
/// serialize rather than being rewritten.
mod metadata_text {
    use serde::{Deserialize, Deserializer, Serializer, ser::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| S::Error::custom(format!("metadata is not UTF-8: {e}")))?;
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}

pub fn sum_amounts(instructions: &[IssueInstruction]) -> Result<TokenAmount, OverflowError> {
    instructions
        .iter()
        .try_fold(0i64, |total, instruction| total.checked_add(instruction.amount))
        .ok_or(OverflowError)
}

/// Unspent output supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Utxo {
    pub txid: Txid,
    pub vout: u32,
    pub satoshis: u64,
    #[serde(rename = "scriptPubKey")]
    pub script_pubkey: ScriptBuf,
    #[serde(
        rename = "tokenAmount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub token_amount: Option<u64>,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }

    pub fn tx_out(&self) -> TxOut {
        TxOut {
            value: Amount::from_sat(self.satoshis),
            script_pubkey: self.script_pubkey.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema() {
        let schema = parse_schema(&[7u8; 20], "TAALT", 10000).unwrap();
        assert_eq!(schema.symbol, "TAALT");
        assert_eq!(schema.total_supply, 10000);
        assert_eq!(schema.issuer_fingerprint.as_byte_array(), &[7u8; 20]);
    }

    #[test]
    fn test_parse_schema_rejects_bad_supply() {
        for supply in [0, -1, i64::MAX] {
            assert_eq!(
                parse_schema(&[7u8; 20], "TAALT", supply),
                Err(SchemaError::InvalidSupply(supply))
            );
        }
        let max = i64::try_from(MAX_SATOSHIS).unwrap();
        assert!(parse_schema(&[7u8; 20], "TAALT", max).is_ok());
        assert!(parse_schema(&[7u8; 20], "TAALT", max + 1).is_err());
    }

    #[test]
    fn test_parse_schema_rejects_bad_fingerprint_and_symbol() {
        assert_eq!(
            parse_schema(&[7u8; 19], "TAALT", 1),
            Err(SchemaError::InvalidFingerprint(19))
        );
        assert!(matches!(
            parse_schema(&[7u8; 20], "", 1),
            Err(SchemaError::InvalidSymbol(_))
        ));
        assert!(matches!(
            parse_schema(&[7u8; 20], "TA AL", 1),
            Err(SchemaError::InvalidSymbol(_))
        ));
        assert!(matches!(
            parse_schema(&[7u8; 20], &"A".repeat(129), 1),
            Err(SchemaError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_schema_json_roundtrip() {
        let schema = parse_schema(&[9u8; 20], "TOK", 5).unwrap();
        let bytes = schema.to_json_bytes().unwrap();
        assert_eq!(TokenSchema::from_json_bytes(&bytes).unwrap(), schema);
        assert!(TokenSchema::from_json_bytes(b"{}").is_err());
    }

    #[test]
    fn test_sum_amounts() {
        let instructions = vec![
            IssueInstruction::new("a", 7000, "One"),
            IssueInstruction::new("b", 3000, "Two"),
        ];
        assert_eq!(sum_amounts(&instructions), Ok(10000));
        assert_eq!(sum_amounts(&[]), Ok(0));

        let negative = vec![
            IssueInstruction::new("a", 13000, "One"),
            IssueInstruction::new("b", -3000, "Two"),
        ];
        assert_eq!(sum_amounts(&negative), Ok(10000));
    }

    #[test]
    fn test_sum_amounts_overflow() {
        let instructions = vec![
            IssueInstruction::new("a", i64::MAX, ""),
            IssueInstruction::new("b", 1, ""),
        ];
        assert_eq!(sum_amounts(&instructions), Err(OverflowError));
    }

    #[test]
    fn test_instruction_record_shape() {
        let instruction: IssueInstruction =
            serde_json::from_str(r#"{"addr":"x","satoshis":7000,"data":"One"}"#).unwrap();
        assert_eq!(instruction, IssueInstruction::new("x", 7000, "One"));

        assert!(serde_json::from_str::<IssueInstruction>(r#"{"addr":"x","satoshis":1}"#).is_err());
        assert!(
            serde_json::from_str::<IssueInstruction>(
                r#"{"addr":"x","satoshis":1,"data":"","extra":1}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_instruction_metadata_is_preserved() {
        let instruction = IssueInstruction::new("x", 7000, "Données");
        let json = serde_json::to_string(&instruction).unwrap();
        let parsed: IssueInstruction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, instruction);

        let binary = IssueInstruction::new("x", 7000, vec![0xff, 0xfe, 0x00]);
        let err = serde_json::to_string(&binary).unwrap_err();
        assert!(err.to_string().contains("metadata is not UTF-8"));
    }
}
