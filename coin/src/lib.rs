//! Creator Coin Module
//!
//! Bonding-curve accounting for per-account creator coins:
//! - Polynomial minting for an empty curve, Bancor relay minting afterwards
//! - Inverse Bancor returns on sells
//! - Watermark, minting and reward creator strategies
//! - Height-driven trade replay

pub mod config;
pub mod curve;
pub mod error;
pub mod replay;
pub mod state;
pub mod strategy;

pub use config::{CoinConfig, ConfigError};
pub use error::{CoinError, Result};
pub use replay::{
    ReplayError, ReplayReport, ReplayStep, Replayer, TradeKind, TradeOp, TradeOutcome,
};
pub use state::{BuyResult, CoinState, Reward, SellResult};
pub use strategy::{Strategy, StrategySchedule, UnknownStrategy};

/// Consensus constants
pub mod constants {
    /// Nanos per whole unit of reserve or coin
    pub const NANOS_PER_UNIT: u64 = 1_000_000_000;

    /// Basis point denominator (10_000 = 100%)
    pub const BASIS_POINTS: u64 = 10_000;

    /// Fee taken on every trade (0.01%)
    pub const TRADE_FEE_BASIS_POINTS: u64 = 1;

    /// Reserve ratio of the curve, 1/3 as the network rounds it
    pub const RESERVE_RATIO: f64 = 0.3333333;

    /// Slope of the polynomial curve used while no reserve is locked
    pub const SLOPE: f64 = 0.003;

    /// Remainders below this many nanos are swept into a sell
    pub const SELL_DUST_THRESHOLD: u64 = 10;
}
