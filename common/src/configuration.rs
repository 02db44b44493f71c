use crate::address::Ss58Codec;
use crate::balance::{BalanceError, BalanceNormalizer};
use crate::types::NetworkId;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_SECTION_GENESIS: &str = "genesis";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Layer the caller's configuration over a module's embedded defaults
pub fn with_defaults(defaults: &str, config: &Config) -> Result<Config, config::ConfigError> {
    Config::builder()
        .add_source(File::from_str(defaults, FileFormat::Toml))
        .add_source(config.clone())
        .build()
}

/// Target chain parameters (from the `[genesis]` section)
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisConfig {
    /// SS58 prefix of the target chain
    pub network_id: NetworkId,

    /// Fractional digits of the target chain's token
    pub token_decimals: u32,

    /// Minimum balance, in display units
    pub existential_deposit: String,
}

impl GenesisConfig {
    pub fn try_load(config: &Config) -> Result<Self, ConfigError> {
        let full = with_defaults(include_str!("../config.default.toml"), config)?;
        let cfg: Self = full.get(CONFIG_SECTION_GENESIS)?;
        cfg.normalizer().map_err(|e| ConfigError::Invalid {
            key: "genesis.existential_deposit",
            reason: e.to_string(),
        })?;
        Ok(cfg)
    }

    pub fn codec(&self) -> Ss58Codec {
        Ss58Codec::new(self.network_id)
    }

    /// A fresh normaliser with an empty issuance total
    pub fn normalizer(&self) -> Result<BalanceNormalizer, BalanceError> {
        BalanceNormalizer::new(self.token_decimals, &self.existential_deposit)
    }
}
