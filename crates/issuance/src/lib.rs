pub mod address;
pub mod assemble;
pub mod contract;
pub mod core;
pub mod error;
pub mod issue;
pub mod model;
pub mod plan;
pub mod script;
pub mod signer;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use address::{AddressError, AddressErrorReason, ValidAddress, validate_address};
pub use assemble::{SignedTransaction, TokenOutput, decode_transaction};
pub use contract::{ContractRequest, build_contract, utxo_from_transaction};
pub use core::{IssuanceConfig, Network};
pub use error::IssueError;
pub use issue::{IssueRequest, Issuer, issue};
pub use model::{IssueInstruction, TokenAmount, TokenSchema, Utxo, parse_schema, sum_amounts};
pub use plan::{IssuancePlan, OutputKind, PlannedOutput, build_plan};
pub use signer::{DefaultSigner, InputSigner, SignInputRequest, SignerError};
