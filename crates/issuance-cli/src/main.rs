use std::{fs::canonicalize, path::PathBuf};

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use issuance::Issuer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    command::Command,
    config::{Config, DEFAULT_CONFIG},
};

mod command;
mod config;
mod inspect;
mod issue;

#[derive(Clone, Debug, Parser)]
struct Args {
    /// Config path, relative to the working directory.
    #[arg(long, default_value = "issuance.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_file = canonicalize(&args.config).ok();
    let mut figment = Figment::new().merge(Yaml::string(DEFAULT_CONFIG));
    if let Some(config_file) = &config_file {
        figment = figment.merge(Yaml::file(config_file));
    }

    let config: Config = figment
        .merge(Env::prefixed("ISSUANCE_").split("__"))
        .extract()?;
    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let issuer = Issuer::new(config.issuance.clone());
    match args.command {
        Command::Contract(contract_args) => issue::handle_contract(&issuer, contract_args)?,
        Command::Issue(issue_args) => issue::handle_issue(&issuer, issue_args)?,
        Command::ValidateAddress { address } => {
            inspect::handle_validate_address(&config.issuance, &address)?;
        }
        Command::Address { key } => inspect::handle_address(&config.issuance, &key)?,
        Command::Decode { hex } => inspect::handle_decode(&config.issuance, &hex)?,
    }
    Ok(())
}
