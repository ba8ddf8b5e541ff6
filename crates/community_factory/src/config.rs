//! Factory configuration
//!
//! Loaded from a TOML file, optionally overridden from the environment.

use crate::errors::{CommunityFactoryError, Result};
use community_nft::{Address, LedgerLimits, DEFAULT_MAX_AIRDROP_RECIPIENTS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

pub const ENV_RELAYER: &str = "COMMUNITY_FACTORY_RELAYER";
pub const ENV_FACTORY_ADDRESS: &str = "COMMUNITY_FACTORY_ADDRESS";
pub const ENV_MAX_AIRDROP: &str = "COMMUNITY_FACTORY_MAX_AIRDROP";

fn default_max_airdrop_recipients() -> usize {
    DEFAULT_MAX_AIRDROP_RECIPIENTS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Address of the factory itself, used to derive ledger addresses
    pub factory_address: Address,
    /// Principal allowed to deploy any community
    pub relayer: Address,
    /// Airdrop size limit handed to every deployed ledger
    #[serde(default = "default_max_airdrop_recipients")]
    pub max_airdrop_recipients: usize,
}

impl FactoryConfig {
    pub fn new(factory_address: Address, relayer: Address) -> Self {
        Self {
            factory_address,
            relayer,
            max_airdrop_recipients: DEFAULT_MAX_AIRDROP_RECIPIENTS,
        }
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading factory configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            CommunityFactoryError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CommunityFactoryError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `COMMUNITY_FACTORY_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Invalid values are
    /// logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_RELAYER) {
            match val.parse::<Address>() {
                Ok(relayer) => self.relayer = relayer,
                Err(e) => warn!("Ignoring invalid {}: {}", ENV_RELAYER, e),
            }
        }

        if let Some(val) = lookup(ENV_FACTORY_ADDRESS) {
            match val.parse::<Address>() {
                Ok(address) => self.factory_address = address,
                Err(e) => warn!("Ignoring invalid {}: {}", ENV_FACTORY_ADDRESS, e),
            }
        }

        if let Some(val) = lookup(ENV_MAX_AIRDROP) {
            match val.parse::<usize>() {
                Ok(max) => self.max_airdrop_recipients = max,
                Err(e) => warn!("Ignoring invalid {}: {}", ENV_MAX_AIRDROP, e),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.relayer.is_zero() {
            return Err(CommunityFactoryError::Config(
                "relayer must not be the zero address".to_string(),
            ));
        }
        if self.max_airdrop_recipients == 0 {
            return Err(CommunityFactoryError::Config(
                "max_airdrop_recipients must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ledger_limits(&self) -> LedgerLimits {
        LedgerLimits {
            max_airdrop_recipients: self.max_airdrop_recipients,
        }
    }
}
