mod config;
pub mod constants;
mod network;

pub use config::IssuanceConfig;
pub use network::Network;
