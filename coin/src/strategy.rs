//! Reward strategies
//!
//! The network switched reward rules twice. Coins created before the first
//! switch paid the creator a share of every new supply high, then a share of
//! every mint, and finally a cash-back cut of the reserve paid in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Last block height paying the watermark reward
pub const WATERMARK_UNTIL_HEIGHT: u64 = 15_270;

/// Last block height paying the minting reward
pub const MINTING_UNTIL_HEIGHT: u64 = 21_869;

/// Reward rule applied to buys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Creator receives a cut of supply pushed above the all-time high
    Watermark,
    /// Creator receives a cut of every mint
    Minting,
    /// Creator receives a cut of the reserve paid in
    #[default]
    Reward,
}

impl Strategy {
    /// Strategy active at `height` on the historical schedule
    pub fn from_height(height: u64) -> Self {
        StrategySchedule::default().strategy_at(height)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Watermark => "watermark",
            Strategy::Minting => "minting",
            Strategy::Reward => "reward",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "watermark" => Ok(Strategy::Watermark),
            "minting" => Ok(Strategy::Minting),
            "reward" => Ok(Strategy::Reward),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Block-height thresholds at which the strategy changes
///
/// Heights up to and including `watermark_until` use [`Strategy::Watermark`],
/// heights up to and including `minting_until` use [`Strategy::Minting`],
/// everything above uses [`Strategy::Reward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySchedule {
    pub watermark_until: u64,
    pub minting_until: u64,
}

impl Default for StrategySchedule {
    fn default() -> Self {
        Self {
            watermark_until: WATERMARK_UNTIL_HEIGHT,
            minting_until: MINTING_UNTIL_HEIGHT,
        }
    }
}

impl StrategySchedule {
    pub fn strategy_at(&self, height: u64) -> Strategy {
        if height <= self.watermark_until {
            Strategy::Watermark
        } else if height <= self.minting_until {
            Strategy::Minting
        } else {
            Strategy::Reward
        }
    }

    /// Thresholds must not overlap
    pub fn is_ordered(&self) -> bool {
        self.watermark_until <= self.minting_until
    }
}
