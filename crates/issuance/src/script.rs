//! Locking scripts used by contract and token outputs.
//!
//! Both are a pay-to-pubkey-hash prefix followed by `OP_RETURN` and data pushes:
//!
//! - contract: `<p2pkh issuer> OP_RETURN <schema json>`
//! - token: `<p2pkh owner> OP_RETURN <issuer pkh> <amount u64 le> <symbol> [<metadata>]`

use bitcoin::{
    PubkeyHash, Script, ScriptBuf,
    hashes::Hash,
    opcodes::all::{OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160, OP_RETURN},
    script::{Builder, Instruction, PushBytesBuf},
};

use crate::{
    core::constants::PUBKEY_HASH_LEN,
    error::{ArgumentError, SchemaError},
    model::TokenSchema,
};

const P2PKH_DATA_PREFIX_OPS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenScriptData {
    pub owner: PubkeyHash,
    pub issuer: PubkeyHash,
    pub amount: u64,
    pub symbol: String,
    pub metadata: Vec<u8>,
}

/// Identity of the token a contract or issuance output belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenOrigin {
    pub issuer_fingerprint: PubkeyHash,
    pub symbol: String,
}

impl From<&TokenSchema> for TokenOrigin {
    fn from(schema: &TokenSchema) -> Self {
        Self {
            issuer_fingerprint: schema.issuer_fingerprint,
            symbol: schema.symbol.clone(),
        }
    }
}

impl From<&TokenScriptData> for TokenOrigin {
    fn from(data: &TokenScriptData) -> Self {
        Self {
            issuer_fingerprint: data.issuer,
            symbol: data.symbol.clone(),
        }
    }
}

fn push_bytes(bytes: Vec<u8>) -> Result<PushBytesBuf, ArgumentError> {
    PushBytesBuf::try_from(bytes).map_err(|_| ArgumentError {
        field: "data push exceeds script limits".to_string(),
    })
}

fn p2pkh_with_data(owner: &PubkeyHash) -> Builder {
    Builder::new()
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(owner)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .push_opcode(OP_RETURN)
}

pub fn token_script(data: &TokenScriptData) -> Result<ScriptBuf, ArgumentError> {
    let mut builder = p2pkh_with_data(&data.owner)
        .push_slice(data.issuer)
        .push_slice(data.amount.to_le_bytes())
        .push_slice(push_bytes(data.symbol.as_bytes().to_vec())?);
    if !data.metadata.is_empty() {
        builder = builder.push_slice(push_bytes(data.metadata.clone())?);
    }
    Ok(builder.into_script())
}

pub fn contract_script(schema: &TokenSchema) -> Result<ScriptBuf, SchemaError> {
    let json = push_bytes(schema.to_json_bytes()?)
        .map_err(|e| SchemaError::Malformed(e.field))?;
    Ok(p2pkh_with_data(&schema.issuer_fingerprint)
        .push_slice(json)
        .into_script())
}

/// Splits a `<p2pkh> OP_RETURN <push>*` script into its owner hash and data pushes.
fn split_data_script(script: &Script) -> Option<(PubkeyHash, Vec<Vec<u8>>)> {
    let instructions = script.instructions().collect::<Result<Vec<_>, _>>().ok()?;
    let (head, data) = instructions.split_at_checked(P2PKH_DATA_PREFIX_OPS)?;

    let [
        Instruction::Op(dup),
        Instruction::Op(hash160),
        Instruction::PushBytes(owner),
        Instruction::Op(equal_verify),
        Instruction::Op(checksig),
        Instruction::Op(op_return),
    ] = head
    else {
        return None;
    };
    if (*dup, *hash160, *equal_verify, *checksig, *op_return)
        != (OP_DUP, OP_HASH160, OP_EQUALVERIFY, OP_CHECKSIG, OP_RETURN)
    {
        return None;
    }
    let owner: [u8; PUBKEY_HASH_LEN] = owner.as_bytes().try_into().ok()?;

    let data = data
        .iter()
        .map(|instruction| match instruction {
            Instruction::PushBytes(bytes) => Some(bytes.as_bytes().to_vec()),
            Instruction::Op(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;

    Some((PubkeyHash::from_byte_array(owner), data))
}

pub fn parse_token_script(script: &Script) -> Option<TokenScriptData> {
    let (owner, data) = split_data_script(script)?;
    let (issuer, amount, symbol, metadata) = match data.as_slice() {
        [issuer, amount, symbol] => (issuer, amount, symbol, Vec::new()),
        [issuer, amount, symbol, metadata] => (issuer, amount, symbol, metadata.clone()),
        _ => return None,
    };

    let issuer: [u8; PUBKEY_HASH_LEN] = issuer.as_slice().try_into().ok()?;
    let amount: [u8; 8] = amount.as_slice().try_into().ok()?;
    let symbol = String::from_utf8(symbol.clone()).ok()?;

    Some(TokenScriptData {
        owner,
        issuer: PubkeyHash::from_byte_array(issuer),
        amount: u64::from_le_bytes(amount),
        symbol,
        metadata,
    })
}

/// Returns the schema committed by a contract output locked to its issuer.
pub fn parse_contract_script(script: &Script) -> Option<TokenSchema> {
    let (owner, data) = split_data_script(script)?;
    let [json] = data.as_slice() else {
        return None;
    };
    let schema = TokenSchema::from_json_bytes(json).ok()?;
    (schema.issuer_fingerprint == owner).then_some(schema)
}
