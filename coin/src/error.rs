//! Creator coin error types

use thiserror::Error;

/// Errors raised by coin trades and initialization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinError {
    #[error("Creator coin was initialized already (supply {supply})")]
    AlreadyInitialized { supply: u64 },

    #[error("Incorrect reward basis points: {0}")]
    InvalidRewardRate(u64),

    #[error("Invalid amount after fees: {0}")]
    ZeroTradeAmount(u64),

    #[error("Amount of coins is out of supply: requested {requested}, supply {supply}")]
    AmountExceedsSupply { requested: u64, supply: u64 },

    #[error("Invalid held amount: trying to sell {amount} out of {held}")]
    InsufficientHeld { amount: u64, held: u64 },

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Ledger overflow: {0}")]
    Overflow(String),
}

pub type Result<T> = std::result::Result<T, CoinError>;
