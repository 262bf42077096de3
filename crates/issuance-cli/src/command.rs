use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Build the contract transaction committing a token schema.
    Contract(ContractArgs),
    /// Build and sign an issuance transaction from a contract output.
    Issue(IssueArgs),
    /// Check an address against the configured network.
    ValidateAddress { address: String },
    /// Print the address controlled by a WIF key on the configured network.
    Address {
        #[arg(env = "ISSUER_KEY")]
        key: String,
    },
    /// Decode a signed transaction and list its token outputs.
    Decode { hex: String },
}

#[derive(Args, Clone, Debug)]
pub struct ContractArgs {
    /// Issuer key in WIF.
    #[arg(long, env = "ISSUER_KEY")]
    pub issuer_key: String,
    /// JSON file with the issuer's spendable outputs.
    #[arg(long)]
    pub utxos: PathBuf,
    #[arg(long)]
    pub symbol: String,
    #[arg(long)]
    pub supply: i64,
    /// JSON file with the output paying the contract fee.
    #[arg(long, requires = "funding_key")]
    pub funding_utxo: Option<PathBuf>,
    /// Funding key in WIF.
    #[arg(long, env = "FUNDING_KEY", requires = "funding_utxo")]
    pub funding_key: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct IssueArgs {
    /// Issuer key in WIF.
    #[arg(long, env = "ISSUER_KEY")]
    pub issuer_key: String,
    /// JSON file with the `{addr, satoshis, data}` issue records.
    #[arg(long)]
    pub instructions: PathBuf,
    /// JSON file with the contract or prior issuance output.
    #[arg(long)]
    pub contract_utxo: PathBuf,
    /// JSON file with the output paying fees. Omit for an unfunded issuance.
    #[arg(long)]
    pub funding_utxo: Option<PathBuf>,
    /// Funding key in WIF.
    #[arg(long, env = "FUNDING_KEY")]
    pub funding_key: Option<String>,
    /// Add a split output per recipient.
    #[arg(long)]
    pub split: bool,
    #[arg(long, default_value_t = 2)]
    pub fee_count: u32,
    /// Skip the supply balance check.
    #[arg(long)]
    pub unchecked: bool,
}
