use issuance::IssuanceConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub log_filter: String,
    pub issuance: IssuanceConfig,
}

pub const DEFAULT_CONFIG: &str = r#"
log_filter: "issuance=debug,issuance_cli=info,info"
issuance:
  network: "testnet"
  satoshis_per_token: 1
  split_output_satoshis: 1
  fee_output_satoshis: 500
  fee_rate: 500
"#;

#[cfg(test)]
mod tests {
    use figment::{
        Figment,
        providers::{Format, Yaml},
    };
    use issuance::Network;

    use super::*;

    #[test]
    fn test_default_config_matches_library_defaults() {
        let config: Config = Figment::new()
            .merge(Yaml::string(DEFAULT_CONFIG))
            .extract()
            .unwrap();
        assert_eq!(config.issuance, IssuanceConfig::new(Network::Testnet));
    }

    #[test]
    fn test_override_network() {
        let config: Config = Figment::new()
            .merge(Yaml::string(DEFAULT_CONFIG))
            .merge(Yaml::string("issuance:\n  network: \"mainnet\"\n"))
            .extract()
            .unwrap();
        assert_eq!(config.issuance.network, Network::Mainnet);
        assert_eq!(
            config.issuance.fee_address(),
            Network::Mainnet.default_fee_address()
        );
    }
}
