use bitcoin::{PrivateKey, key::Secp256k1, secp256k1::All};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    address::ValidAddress,
    assemble::{AssembleRequest, Funding, SignedTransaction, assemble},
    contract::{ContractRequest, build_contract},
    core::IssuanceConfig,
    error::{IssueError, UtxoError, UtxoRole},
    model::{IssueInstruction, TokenAmount, Utxo},
    plan::{PlanRequest, build_plan, build_plan_unchecked},
    script::{TokenOrigin, parse_contract_script, parse_token_script},
    signer::{DefaultSigner, InputSigner},
    validation::{
        ensure_instructions, validate_funding_utxo, validate_instructions, validate_utxo,
    },
};

#[derive(Clone, Copy, Debug)]
pub struct IssueRequest<'a> {
    pub issuer_key: &'a PrivateKey,
    pub instructions: &'a [IssueInstruction],
    /// Contract or prior issuance output carrying the tokens to distribute.
    pub contract_utxo: &'a Utxo,
    pub funding_utxo: Option<&'a Utxo>,
    pub funding_key: Option<&'a PrivateKey>,
    pub split: bool,
    pub fee_count: u32,
}

/// Issuance entry point bound to a configuration and a signing capability.
pub struct Issuer<S = DefaultSigner> {
    config: IssuanceConfig,
    signer: S,
    secp: Secp256k1<All>,
}

impl Issuer<DefaultSigner> {
    pub fn new(config: IssuanceConfig) -> Self {
        Self::with_signer(config, DefaultSigner::new())
    }
}

impl<S: InputSigner> Issuer<S> {
    pub fn with_signer(config: IssuanceConfig, signer: S) -> Self {
        Self {
            config,
            signer,
            secp: Secp256k1::new(),
        }
    }

    pub fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    /// Validates, plans, assembles and signs an issuance transaction.
    pub fn issue(&self, request: &IssueRequest<'_>) -> Result<SignedTransaction, IssueError> {
        self.run(request, true)
    }

    /// Like [`Issuer::issue`] but without the supply equality check. The result
    /// is not spendable on the ledger when the amounts do not balance.
    pub fn issue_unchecked(
        &self,
        request: &IssueRequest<'_>,
    ) -> Result<SignedTransaction, IssueError> {
        self.run(request, false)
    }

    /// Issues from loosely typed caller records, rejecting malformed ones
    /// before any planning.
    #[allow(clippy::too_many_arguments)]
    pub fn issue_records(
        &self,
        issuer_key: &PrivateKey,
        instructions: &Value,
        contract_utxo: &Value,
        funding_utxo: &Value,
        funding_key: Option<&PrivateKey>,
        split: bool,
        fee_count: u32,
    ) -> Result<SignedTransaction, IssueError> {
        let instructions = validate_instructions(instructions)?;
        let contract_utxo = validate_utxo(contract_utxo, UtxoRole::Contract)?;
        let funding_utxo = validate_funding_utxo(funding_utxo)?;

        self.issue(&IssueRequest {
            issuer_key,
            instructions: &instructions,
            contract_utxo: &contract_utxo,
            funding_utxo: funding_utxo.as_ref(),
            funding_key,
            split,
            fee_count,
        })
    }

    pub fn contract(&self, request: &ContractRequest<'_>) -> Result<SignedTransaction, IssueError> {
        build_contract(request, &self.config, &self.signer)
    }

    fn run(
        &self,
        request: &IssueRequest<'_>,
        enforce_balance: bool,
    ) -> Result<SignedTransaction, IssueError> {
        ensure_instructions(request.instructions)?;
        let (origin, available) = token_origin(request.contract_utxo, &self.config)?;

        let funding = match (request.funding_utxo, request.funding_key) {
            (Some(utxo), Some(key)) => Some(Funding { utxo, key }),
            (None, None) => None,
            _ => {
                debug!("paymentUtxo rejected: funding output and key must be given together");
                return Err(UtxoError::new(UtxoRole::Payment).into());
            }
        };
        let change_address = funding.map(|funding| {
            let public_key = funding.key.public_key(&self.secp);
            ValidAddress::from_public_key(&public_key, self.config.network)
        });

        let plan_request = PlanRequest {
            instructions: request.instructions,
            available,
            origin,
            split: request.split,
            fee_count: request.fee_count,
            change_address,
        };
        let plan = if enforce_balance {
            build_plan(plan_request, &self.config)?
        } else {
            build_plan_unchecked(plan_request, &self.config)?
        };

        let signed = assemble(
            &AssembleRequest {
                plan: &plan,
                contract_utxo: request.contract_utxo,
                issuer_key: request.issuer_key,
                funding,
            },
            &self.config,
            &self.signer,
        )?;
        info!(
            txid = %signed.txid,
            symbol = %plan.origin.symbol,
            total = plan.total,
            "Issued tokens"
        );
        Ok(signed)
    }
}

/// Token identity and the units available on the consumed output.
///
/// Units come from the record's `token_amount` when present, otherwise from
/// its satoshi value. Either way the satoshi value must be exactly the units
/// times the per-token value.
fn token_origin(
    utxo: &Utxo,
    config: &IssuanceConfig,
) -> Result<(TokenOrigin, TokenAmount), UtxoError> {
    let invalid = |reason: &str| {
        debug!("contractUtxo rejected: {reason}");
        UtxoError::new(UtxoRole::Contract)
    };

    let origin = parse_contract_script(&utxo.script_pubkey)
        .map(|schema| TokenOrigin::from(&schema))
        .or_else(|| {
            parse_token_script(&utxo.script_pubkey).map(|data| TokenOrigin::from(&data))
        })
        .ok_or_else(|| invalid("not a contract or token output"))?;

    let units = match utxo.token_amount {
        Some(units) => {
            if units.checked_mul(config.satoshis_per_token) != Some(utxo.satoshis) {
                return Err(invalid("value does not match its token amount"));
            }
            units
        }
        None => utxo
            .satoshis
            .checked_rem(config.satoshis_per_token)
            .filter(|rest| *rest == 0)
            .and_then(|_| utxo.satoshis.checked_div(config.satoshis_per_token))
            .ok_or_else(|| invalid("value is not a whole number of tokens"))?,
    };
    let available =
        TokenAmount::try_from(units).map_err(|_| invalid("token amount out of range"))?;

    Ok((origin, available))
}

/// Builds and signs an issuance transaction, returning its hex serialization.
///
/// Passing `None` for both `funding_utxo` and `funding_key` yields an unfunded
/// issuance: split and fee outputs are dropped.
#[allow(clippy::too_many_arguments)]
pub fn issue(
    issuer_key: &PrivateKey,
    instructions: &[IssueInstruction],
    contract_utxo: &Utxo,
    funding_utxo: Option<&Utxo>,
    funding_key: Option<&PrivateKey>,
    split: bool,
    fee_count: u32,
    config: &IssuanceConfig,
) -> Result<String, IssueError> {
    let signed = Issuer::new(config.clone()).issue(&IssueRequest {
        issuer_key,
        instructions,
        contract_utxo,
        funding_utxo,
        funding_key,
        split,
        fee_count,
    })?;
    Ok(signed.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Network,
        test_utils::{contract_fixture, test_address},
    };

    fn instructions() -> Vec<IssueInstruction> {
        vec![
            IssueInstruction::new(test_address(10, Network::Testnet), 7000, "One"),
            IssueInstruction::new(test_address(11, Network::Testnet), 3000, "Two"),
        ]
    }

    #[test]
    fn test_token_origin_from_contract_output() {
        let config = IssuanceConfig::default();
        let fixture = contract_fixture(10000, &config);
        let (origin, available) = token_origin(&fixture.contract_utxo, &config).unwrap();
        assert_eq!(origin, TokenOrigin::from(&fixture.schema));
        assert_eq!(available, 10000);

        let mut without_amount = fixture.contract_utxo.clone();
        without_amount.token_amount = None;
        let (_, available) = token_origin(&without_amount, &config).unwrap();
        assert_eq!(available, 10000);

        let uneven = IssuanceConfig {
            satoshis_per_token: 3,
            ..IssuanceConfig::default()
        };
        assert!(token_origin(&without_amount, &uneven).is_err());
        assert!(token_origin(&fixture.contract_utxo, &uneven).is_err());

        let mut surplus = fixture.contract_utxo.clone();
        surplus.satoshis = 20000;
        assert!(token_origin(&surplus, &config).is_err());
        assert!(token_origin(&fixture.payment_utxo, &config).is_err());
    }

    #[test]
    fn test_issue_returns_hex() {
        let config = IssuanceConfig::default();
        let fixture = contract_fixture(10000, &config);
        let hex = issue(
            &fixture.issuer_key,
            &instructions(),
            &fixture.contract_utxo,
            Some(&fixture.payment_utxo),
            Some(&fixture.funding_key),
            true,
            2,
            &config,
        )
        .unwrap();
        let decoded = crate::decode_transaction(&hex).unwrap();
        assert_eq!(decoded.transaction.output.len(), 7);
    }

    #[test]
    fn test_funding_key_without_utxo() {
        let config = IssuanceConfig::default();
        let fixture = contract_fixture(10000, &config);
        let err = issue(
            &fixture.issuer_key,
            &instructions(),
            &fixture.contract_utxo,
            None,
            Some(&fixture.funding_key),
            false,
            0,
            &config,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "paymentUtxo is invalid");
    }

    #[test]
    fn test_empty_instructions() {
        let config = IssuanceConfig::default();
        let fixture = contract_fixture(10000, &config);
        let err = issue(
            &fixture.issuer_key,
            &[],
            &fixture.contract_utxo,
            None,
            None,
            false,
            0,
            &config,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "issueInfo is invalid");
    }
}
