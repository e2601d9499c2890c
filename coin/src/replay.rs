//! Trade replay
//!
//! Drives one coin through an ordered list of historical trades. Each trade
//! carries the block height it was mined at, which selects the strategy, and
//! the creator's reward rate at that time. Sells go through the dust sweep
//! before hitting the curve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CoinConfig;
use crate::error::CoinError;
use crate::state::{BuyResult, CoinState, SellResult};
use crate::strategy::{Strategy, StrategySchedule};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Trade {index} at height {height} failed: {source}")]
    Trade {
        index: usize,
        height: u64,
        #[source]
        source: CoinError,
    },

    #[error("Invalid trade list: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TradeKind {
    /// Spend `amount` reserve nanos
    Buy { amount: u64 },
    /// Sell `amount` out of `held` coin nanos
    Sell { amount: u64, held: u64 },
}

/// A historical trade against one coin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOp {
    pub height: u64,
    #[serde(default)]
    pub trader_is_creator: bool,
    #[serde(default)]
    pub reward_basis_points: u64,
    #[serde(flatten)]
    pub kind: TradeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Bought(BuyResult),
    Sold(SellResult),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    pub index: usize,
    pub height: u64,
    pub strategy: Strategy,
    pub outcome: TradeOutcome,
}

/// Per-trade results plus the ledger left at the end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub steps: Vec<ReplayStep>,
    pub locked: u64,
    pub supply: u64,
    pub watermark: u64,
    pub rate: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Replayer {
    schedule: StrategySchedule,
}

impl Replayer {
    pub fn new(schedule: StrategySchedule) -> Self {
        Self { schedule }
    }

    pub fn from_config(config: &CoinConfig) -> Self {
        Self::new(config.schedule)
    }

    /// Parse a JSON array of trades
    pub fn parse_ops(json: &str) -> Result<Vec<TradeOp>, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply a single trade to `coin`
    pub fn apply(&self, coin: &mut CoinState, op: &TradeOp) -> crate::Result<TradeOutcome> {
        coin.set_strategy(self.schedule.strategy_at(op.height))
            .set_reward(op.reward_basis_points)
            .set_is_creator(op.trader_is_creator);

        match op.kind {
            TradeKind::Buy { amount } => coin.buy(amount, false).map(TradeOutcome::Bought),
            TradeKind::Sell { amount, held } => {
                let amount = coin.adjust_sell_amount(amount, held)?;
                coin.sell(amount, false).map(TradeOutcome::Sold)
            }
        }
    }

    /// Apply `ops` in order, stopping at the first rejected trade
    pub fn replay(
        &self,
        coin: &mut CoinState,
        ops: &[TradeOp],
    ) -> Result<ReplayReport, ReplayError> {
        let mut steps = Vec::with_capacity(ops.len());

        for (index, op) in ops.iter().enumerate() {
            let outcome = self.apply(coin, op).map_err(|source| {
                log::warn!("Trade {} at height {} rejected: {}", index, op.height, source);
                ReplayError::Trade {
                    index,
                    height: op.height,
                    source,
                }
            })?;

            steps.push(ReplayStep {
                index,
                height: op.height,
                strategy: coin.strategy(),
                outcome,
            });
        }

        log::debug!(
            "Replayed {} trades: locked={} supply={}",
            steps.len(),
            coin.locked(),
            coin.supply()
        );

        Ok(ReplayReport {
            steps,
            locked: coin.locked(),
            supply: coin.supply(),
            watermark: coin.watermark(),
            rate: coin.rate(),
        })
    }
}
