//! Bonding curve formulas
//!
//! Amounts enter and leave as integer nanos. Inside, values are scaled to
//! whole units and evaluated in double precision; results are truncated
//! toward zero on the way back to nanos. Replaying historical trades depends
//! on this exact rounding, so keep the operation order as written.

use crate::constants::{
    BASIS_POINTS, NANOS_PER_UNIT, RESERVE_RATIO, SLOPE, TRADE_FEE_BASIS_POINTS,
};

fn to_units(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_UNIT as f64
}

fn to_nanos(units: f64) -> u64 {
    // `as` truncates toward zero and maps NaN and negatives to 0
    (units * NANOS_PER_UNIT as f64) as u64
}

/// Deduct the 0.01% trade fee, rounding down
pub fn apply_trade_fee(amount: u64) -> u64 {
    basis_points_of(amount, BASIS_POINTS - TRADE_FEE_BASIS_POINTS)
}

/// `floor(amount * basis_points / 10000)`
pub fn basis_points_of(amount: u64, basis_points: u64) -> u64 {
    (amount as u128 * basis_points as u128 / BASIS_POINTS as u128) as u64
}

/// Tokens minted for `amount` when the curve holds no reserve
pub fn polynomial_minting(amount: u64, supply: u64) -> u64 {
    let delta_amount = to_units(amount);
    let delta_supply = to_units(supply);
    let minted = ((delta_amount
        + SLOPE * RESERVE_RATIO * delta_supply.powf(1.0 / RESERVE_RATIO))
        / (SLOPE * RESERVE_RATIO))
        .powf(RESERVE_RATIO)
        - delta_supply;
    to_nanos(minted)
}

/// Tokens minted for `amount` against an existing reserve (Bancor relay)
pub fn bancor_minting(amount: u64, supply: u64, locked: u64) -> u64 {
    let delta_amount = to_units(amount);
    let delta_supply = to_units(supply);
    let delta_locked = to_units(locked);
    let minted =
        delta_supply * ((1.0 + delta_amount / delta_locked).powf(RESERVE_RATIO) - 1.0);
    to_nanos(minted)
}

/// Reserve released by burning `amount` tokens, capped at `locked`
///
/// Callers must ensure `0 < amount <= supply`.
pub fn bancor_returned(amount: u64, supply: u64, locked: u64) -> u64 {
    let delta_amount = to_units(amount);
    let delta_supply = to_units(supply);
    let delta_locked = to_units(locked);
    let returned = (delta_locked
        * (1.0 - (1.0 - delta_amount / delta_supply).powf(1.0 / RESERVE_RATIO)))
        * NANOS_PER_UNIT as f64;
    if returned >= locked as f64 {
        return locked;
    }
    returned as u64
}

/// `floor(numerator / denominator * NANOS_PER_UNIT)`, or `None` for a zero denominator
pub fn nanos_rate(numerator: u64, denominator: u64) -> Option<u64> {
    if denominator == 0 {
        return None;
    }
    Some(((numerator as f64 / denominator as f64) * NANOS_PER_UNIT as f64) as u64)
}
