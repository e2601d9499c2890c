//! Coin configuration (TOML)
//!
//! Example:
//! ```toml
//! reward_basis_points = 1000
//! is_creator = false
//!
//! [schedule]
//! watermark_until = 15270
//! minting_until = 21869
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::constants::BASIS_POINTS;
use crate::state::CoinState;
use crate::strategy::StrategySchedule;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinConfig {
    #[serde(default)]
    pub reward_basis_points: u64,

    #[serde(default = "default_is_creator")]
    pub is_creator: bool,

    #[serde(default)]
    pub schedule: StrategySchedule,
}

fn default_is_creator() -> bool {
    true
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            reward_basis_points: 0,
            is_creator: default_is_creator(),
            schedule: StrategySchedule::default(),
        }
    }
}

impl CoinConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoinConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reward_basis_points > BASIS_POINTS {
            return Err(ConfigError::Invalid(format!(
                "reward_basis_points {} exceeds {}",
                self.reward_basis_points, BASIS_POINTS
            )));
        }

        if !self.schedule.is_ordered() {
            return Err(ConfigError::Invalid(format!(
                "schedule minting_until {} is below watermark_until {}",
                self.schedule.minting_until, self.schedule.watermark_until
            )));
        }

        Ok(())
    }

    /// Empty coin carrying this configuration's reward and creator flag
    pub fn build_coin(&self) -> CoinState {
        let mut coin = CoinState::create(self.reward_basis_points);
        coin.set_is_creator(self.is_creator);
        coin
    }
}
