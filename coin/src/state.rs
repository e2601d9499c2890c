//! Creator coin ledger
//!
//! [`CoinState`] tracks the reserve locked in a creator coin and the coins
//! in circulation. Buys deposit reserve and mint coins along the bonding
//! curve, sells burn coins and release reserve. The active [`Strategy`]
//! decides how the creator's reward is carved out of each buy.

use serde::{Deserialize, Serialize};

use crate::constants::{BASIS_POINTS, SELL_DUST_THRESHOLD};
use crate::curve;
use crate::error::{CoinError, Result};
use crate::strategy::{Strategy, StrategySchedule};

/// Creator reward withheld from a buy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    /// Reserve nanos kept back from the deposit (reward strategy)
    pub amount: u64,
    /// Coin nanos kept back from the mint (watermark and minting strategies)
    pub coin: u64,
}

/// Outcome of a buy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyResult {
    pub preview: bool,
    /// Reserve nanos deposited into the curve after fee and reward
    pub amount: u64,
    /// Coin nanos created by the curve
    pub minted: u64,
    /// Coin nanos credited to the buyer
    pub received: u64,
    pub reward: Reward,
    /// Effective price in reserve nanos per whole coin
    pub rate: u64,
}

/// Outcome of a sell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellResult {
    pub preview: bool,
    /// Coin nanos burned
    pub amount: u64,
    /// Reserve nanos credited to the seller after fee
    pub returned: u64,
    /// Effective price in reserve nanos per whole coin
    pub rate: u64,
}

/// Ledger values a trade leaves behind
#[derive(Debug, Clone, Copy)]
struct Settlement {
    locked: u64,
    supply: u64,
    watermark: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinState {
    locked: u64,
    supply: u64,
    rate: u64,
    watermark: u64,
    reward_basis_points: u64,
    is_creator: bool,
    strategy: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_buy: Option<BuyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sell: Option<SellResult>,
}

impl CoinState {
    /// Create an empty coin paying `reward_basis_points` to its creator
    pub fn new(reward_basis_points: u64) -> Self {
        Self {
            locked: 0,
            supply: 0,
            rate: 0,
            watermark: 0,
            reward_basis_points,
            is_creator: true,
            strategy: Strategy::default(),
            last_buy: None,
            last_sell: None,
        }
    }

    pub fn create(reward_basis_points: u64) -> Self {
        Self::new(reward_basis_points)
    }

    /// Seed an empty coin with known reserve and supply
    pub fn init(&mut self, locked: u64, supply: u64) -> Result<&mut Self> {
        self.init_with_watermark(locked, supply, 0)
    }

    /// Seed an empty coin, carrying over a previously reached watermark
    pub fn init_with_watermark(
        &mut self,
        locked: u64,
        supply: u64,
        watermark: u64,
    ) -> Result<&mut Self> {
        if self.supply > 0 {
            return Err(CoinError::AlreadyInitialized {
                supply: self.supply,
            });
        }

        self.locked = locked;
        self.supply = supply;
        self.watermark = supply.max(watermark);
        self.recalculate_rate();

        log::debug!(
            "Initialized coin: locked={} supply={} watermark={} rate={}",
            self.locked,
            self.supply,
            self.watermark,
            self.rate
        );
        Ok(self)
    }

    pub fn set_strategy(&mut self, strategy: Strategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Pick the strategy from the historical height schedule
    pub fn set_strategy_by_height(&mut self, height: u64) -> &mut Self {
        self.set_strategy_by_schedule(&StrategySchedule::default(), height)
    }

    pub fn set_strategy_by_schedule(
        &mut self,
        schedule: &StrategySchedule,
        height: u64,
    ) -> &mut Self {
        self.strategy = schedule.strategy_at(height);
        self
    }

    pub fn set_reward(&mut self, reward_basis_points: u64) -> &mut Self {
        self.reward_basis_points = reward_basis_points;
        self
    }

    pub fn set_is_creator(&mut self, is_creator: bool) -> &mut Self {
        self.is_creator = is_creator;
        self
    }

    /// Watermark never drops below the current supply
    pub fn set_watermark(&mut self, watermark: u64) -> &mut Self {
        self.watermark = self.supply.max(watermark);
        self
    }

    /// Buy coins for `amount` reserve nanos
    ///
    /// With `preview` set the ledger is left untouched and only the result
    /// is recorded.
    pub fn buy(&mut self, amount: u64, preview: bool) -> Result<BuyResult> {
        let (result, settlement) = self.price_buy(amount, preview)?;

        if preview {
            log::trace!("Buy quote: {} nanos -> {} minted", amount, result.minted);
        } else {
            self.settle(settlement);
            log::debug!(
                "Buy: {} nanos -> minted={} received={} reward={:?} locked={} supply={}",
                amount,
                result.minted,
                result.received,
                result.reward,
                self.locked,
                self.supply
            );
        }

        self.last_buy = Some(result.clone());
        Ok(result)
    }

    /// Sell `amount` coin nanos back to the curve
    pub fn sell(&mut self, amount: u64, preview: bool) -> Result<SellResult> {
        let (result, settlement) = self.price_sell(amount, preview)?;

        if preview {
            log::trace!("Sell quote: {} coins -> {} nanos", amount, result.returned);
        } else {
            self.settle(settlement);
            log::debug!(
                "Sell: {} coins -> returned={} locked={} supply={}",
                amount,
                result.returned,
                self.locked,
                self.supply
            );
        }

        self.last_sell = Some(result.clone());
        Ok(result)
    }

    /// Price a buy without touching the ledger or the last buy record
    pub fn quote_buy(&self, amount: u64) -> Result<BuyResult> {
        self.price_buy(amount, true).map(|(result, _)| result)
    }

    /// Price a sell without touching the ledger or the last sell record
    pub fn quote_sell(&self, amount: u64) -> Result<SellResult> {
        self.price_sell(amount, true).map(|(result, _)| result)
    }

    /// Sweep a remainder too small to sell into the sale
    ///
    /// Once the watermark era ended, leaving fewer than
    /// [`SELL_DUST_THRESHOLD`] nanos behind sells the whole holding instead.
    pub fn adjust_sell_amount(&self, amount: u64, held: u64) -> Result<u64> {
        if held < amount {
            return Err(CoinError::InsufficientHeld { amount, held });
        }

        if self.strategy != Strategy::Watermark && held - amount < SELL_DUST_THRESHOLD {
            return Ok(held);
        }

        Ok(amount)
    }

    fn price_buy(&self, amount: u64, preview: bool) -> Result<(BuyResult, Settlement)> {
        // A non-creator paying 100% to the creator would receive nothing
        if self.reward_basis_points == BASIS_POINTS
            && !self.is_creator
            && self.strategy == Strategy::Reward
        {
            return Err(CoinError::InvalidRewardRate(self.reward_basis_points));
        }

        let trade_amount = curve::apply_trade_fee(amount);
        if trade_amount == 0 {
            return Err(CoinError::ZeroTradeAmount(amount));
        }

        let reward_amount = match self.strategy {
            Strategy::Reward if !self.is_creator => {
                curve::basis_points_of(trade_amount, self.reward_basis_points)
            }
            _ => 0,
        };
        // Rates above 100% would withhold more than the trader paid in
        let buy_amount = trade_amount
            .checked_sub(reward_amount)
            .ok_or(CoinError::InvalidRewardRate(self.reward_basis_points))?;

        let minted = if self.locked == 0 {
            curve::polynomial_minting(buy_amount, self.supply)
        } else {
            curve::bancor_minting(buy_amount, self.supply, self.locked)
        };
        let rate = curve::nanos_rate(buy_amount, minted).ok_or_else(|| {
            CoinError::DivisionByZero(format!("buy of {} nanos mints no coins", amount))
        })?;

        let (locked, supply) = if preview {
            (self.locked, self.supply)
        } else {
            let locked = self.locked.checked_add(buy_amount).ok_or_else(|| {
                CoinError::Overflow(format!("locked {} + {}", self.locked, buy_amount))
            })?;
            let supply = self.supply.checked_add(minted).ok_or_else(|| {
                CoinError::Overflow(format!("supply {} + {}", self.supply, minted))
            })?;
            (locked, supply)
        };
        let watermark = supply.max(self.watermark);

        let coin_reward = match self.strategy {
            _ if self.is_creator => 0,
            Strategy::Watermark if watermark > self.watermark => {
                curve::basis_points_of(watermark - self.watermark, self.reward_basis_points)
            }
            Strategy::Minting => curve::basis_points_of(minted, self.reward_basis_points),
            Strategy::Watermark | Strategy::Reward => 0,
        };
        let received = if self.is_creator {
            minted
        } else {
            minted.saturating_sub(coin_reward)
        };

        let result = BuyResult {
            preview,
            amount: buy_amount,
            minted,
            received,
            reward: Reward {
                amount: reward_amount,
                coin: coin_reward,
            },
            rate,
        };
        let settlement = Settlement {
            locked,
            supply,
            watermark: if preview { self.watermark } else { watermark },
        };
        Ok((result, settlement))
    }

    fn price_sell(&self, amount: u64, preview: bool) -> Result<(SellResult, Settlement)> {
        if amount > self.supply {
            return Err(CoinError::AmountExceedsSupply {
                requested: amount,
                supply: self.supply,
            });
        }

        let returned = curve::bancor_returned(amount, self.supply, self.locked);
        let credited = curve::apply_trade_fee(returned);
        let rate = curve::nanos_rate(credited, amount)
            .ok_or_else(|| CoinError::DivisionByZero("sell of zero coins".to_string()))?;

        let settlement = if preview {
            Settlement {
                locked: self.locked,
                supply: self.supply,
                watermark: self.watermark,
            }
        } else {
            let supply = self.supply - amount;
            // A fully redeemed coin keeps no residual reserve
            let locked = if supply == 0 { 0 } else { self.locked - returned };
            Settlement {
                locked,
                supply,
                watermark: self.watermark,
            }
        };

        let result = SellResult {
            preview,
            amount,
            returned: credited,
            rate,
        };
        Ok((result, settlement))
    }

    fn settle(&mut self, settlement: Settlement) {
        self.locked = settlement.locked;
        self.supply = settlement.supply;
        self.watermark = settlement.watermark;
        self.recalculate_rate();
    }

    fn recalculate_rate(&mut self) {
        self.rate = curve::nanos_rate(self.locked, self.supply).unwrap_or(0);
    }

    pub fn locked(&self) -> u64 {
        self.locked
    }

    pub fn supply(&self) -> u64 {
        self.supply
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn reward_basis_points(&self) -> u64 {
        self.reward_basis_points
    }

    pub fn is_creator(&self) -> bool {
        self.is_creator
    }

    pub fn last_buy(&self) -> Option<&BuyResult> {
        self.last_buy.as_ref()
    }

    pub fn last_sell(&self) -> Option<&SellResult> {
        self.last_sell.as_ref()
    }
}

impl Default for CoinState {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buy_new_creator() {
        let mut coin = CoinState::create(0);

        let buy = coin.buy(1000, false).unwrap();
        assert_eq!(coin.rate(), 9993);
        assert_eq!(coin.locked(), 999);
        assert_eq!(coin.supply(), 99_966_681);
        assert_eq!(buy.minted, 99_966_681);
        assert_eq!(buy.reward, Reward::default());

        let buy = coin.buy(1000, false).unwrap();
        assert_eq!(coin.rate(), 15_863);
        assert_eq!(coin.locked(), 1998);
        assert_eq!(coin.supply(), 125_950_122);
        assert_eq!(buy.minted, 25_983_441);
        assert_eq!(buy.rate, 38_447);

        coin.set_reward(1000).set_is_creator(false);
        let buy = coin.buy(1000, false).unwrap();
        assert_eq!(coin.rate(), 20_326);
        assert_eq!(coin.locked(), 2898);
        assert_eq!(coin.supply(), 142_571_554);
        assert_eq!(buy.amount, 900);
        assert_eq!(buy.minted, 16_621_432);
        assert_eq!(buy.received, 16_621_432);
        assert_eq!(buy.reward.coin, 0);
        assert_eq!(buy.reward.amount, 99);
        assert_eq!(coin.last_buy(), Some(&buy));
    }

    #[test]
    fn test_sell_to_zero() {
        let mut coin = CoinState::create(0);
        coin.buy(1000, false).unwrap();

        let sell = coin.sell(50_000, false).unwrap();
        assert_eq!(coin.locked(), 998);
        assert_eq!(coin.supply(), 99_916_681);
        assert_eq!(sell.returned, 0);
        assert_eq!(sell.rate, 0);

        let sell = coin.sell(99_916_681, false).unwrap();
        assert_eq!(coin.locked(), 0);
        assert_eq!(coin.supply(), 0);
        assert_eq!(coin.rate(), 0);
        assert_eq!(sell.returned, 997);

        let result = coin.sell(100_000_000, false);
        assert!(matches!(
            result,
            Err(CoinError::AmountExceedsSupply {
                requested: 100_000_000,
                supply: 0
            })
        ));
    }

    #[test]
    fn test_watermark_strategy() {
        let mut coin = CoinState::create(1000);
        coin.set_is_creator(false).set_strategy(Strategy::Watermark);

        let buy = coin.buy(1_000_000, false).unwrap();
        assert_eq!(buy.reward.amount, 0);
        assert_eq!(buy.reward.coin, 99_996_669);
        assert_eq!(buy.received, 899_970_029);
        assert_eq!(coin.supply(), coin.watermark());

        coin.sell(1_000_000, false).unwrap();
        let buy = coin.buy(2000, false).unwrap();
        assert_eq!(buy.reward.amount, 0);
        assert_eq!(buy.reward.coin, 0);
        assert_eq!(coin.watermark(), 999_966_698);

        let buy = coin.buy(5000, false).unwrap();
        assert_eq!(buy.reward.amount, 0);
        assert_eq!(buy.reward.coin, 133_204);
        assert_eq!(coin.watermark(), coin.supply());
    }

    #[test]
    fn test_minting_strategy() {
        let mut coin = CoinState::create(1000);
        coin.set_is_creator(false).set_strategy(Strategy::Minting);

        let buy = coin.buy(1_000_000, false).unwrap();
        assert_eq!(buy.reward.amount, 0);
        assert_eq!(buy.reward.coin, 99_996_669);

        coin.sell(1_000_000, false).unwrap();
        let buy = coin.buy(2000, false).unwrap();
        assert_eq!(buy.reward.amount, 0);
        assert_eq!(buy.reward.coin, 66_726);
        assert_eq!(buy.received, 600_540);

        let buy = coin.buy(5000, false).unwrap();
        assert_eq!(buy.reward.amount, 0);
        assert_eq!(buy.reward.coin, 166_477);
    }

    #[test]
    fn test_init_locked_supply() {
        let mut coin = CoinState::create(0);
        coin.init(999_900_000, 9_999_664_686).unwrap();
        assert_eq!(coin.rate(), 99_993_352);
        assert_eq!(coin.locked(), 999_900_000);
        assert_eq!(coin.supply(), 9_999_664_686);
        assert_eq!(coin.watermark(), coin.supply());

        let result = coin.init(1, 1);
        assert!(matches!(
            result,
            Err(CoinError::AlreadyInitialized { supply: 9_999_664_686 })
        ));
        assert_eq!(coin.locked(), 999_900_000);
    }

    #[test]
    fn test_init_keeps_higher_watermark() {
        let mut coin = CoinState::create(0);
        coin.init_with_watermark(1000, 5000, 9000).unwrap();
        assert_eq!(coin.watermark(), 9000);

        coin.set_watermark(10);
        assert_eq!(coin.watermark(), 5000);
    }

    #[test]
    fn test_preview_buy_leaves_ledger() {
        let mut coin = CoinState::create(0);
        coin.buy(1000, false).unwrap();
        let before = (coin.locked(), coin.supply(), coin.watermark(), coin.rate());

        let first = coin.buy(1000, true).unwrap();
        let second = coin.buy(1000, true).unwrap();
        assert_eq!(first, second);
        assert!(first.preview);
        assert_eq!(first.minted, 25_983_441);
        assert_eq!(coin.last_buy(), Some(&second));
        assert_eq!(
            (coin.locked(), coin.supply(), coin.watermark(), coin.rate()),
            before
        );
    }

    #[test]
    fn test_preview_sell_leaves_ledger() {
        let mut coin = CoinState::create(0);
        coin.buy(1000, false).unwrap();

        let sell = coin.sell(coin.supply(), true).unwrap();
        assert!(sell.preview);
        assert_eq!(sell.returned, 998);
        assert_eq!(coin.locked(), 999);
        assert_eq!(coin.supply(), 99_966_681);
        assert_eq!(coin.last_sell(), Some(&sell));
    }

    #[test]
    fn test_watermark_preview_pays_no_bonus() {
        let mut coin = CoinState::create(1000);
        coin.set_is_creator(false).set_strategy(Strategy::Watermark);
        coin.buy(1_000_000, false).unwrap();

        let quote = coin.buy(1_000_000, true).unwrap();
        assert_eq!(quote.minted, 259_912_364);
        assert_eq!(quote.reward.coin, 0);
        assert_eq!(coin.watermark(), 999_966_698);
    }

    #[test]
    fn test_quotes_do_not_record() {
        let mut coin = CoinState::create(0);
        coin.buy(1000, false).unwrap();
        let recorded = coin.last_buy().cloned();

        let quote = coin.quote_buy(1000).unwrap();
        assert_eq!(quote.minted, 25_983_441);
        assert_eq!(coin.last_buy().cloned(), recorded);

        let quote = coin.quote_sell(50_000).unwrap();
        assert_eq!(quote.returned, 0);
        assert!(coin.last_sell().is_none());
    }

    #[test]
    fn test_full_reward_rejected_for_trader() {
        let mut coin = CoinState::create(10_000);
        coin.set_is_creator(false);
        assert!(matches!(
            coin.buy(1000, false),
            Err(CoinError::InvalidRewardRate(10_000))
        ));

        // Creator and older strategies are allowed through
        coin.set_is_creator(true);
        assert!(coin.buy(1000, true).is_ok());

        coin.set_is_creator(false).set_strategy(Strategy::Minting);
        let buy = coin.buy(1000, false).unwrap();
        assert_eq!(buy.reward.coin, buy.minted);
        assert_eq!(buy.received, 0);
    }

    #[test]
    fn test_reward_above_full_rejected() {
        let mut coin = CoinState::create(0);
        coin.buy(1000, false).unwrap();
        coin.set_reward(10_001).set_is_creator(false);
        let before = coin.clone();

        assert!(matches!(
            coin.buy(1_000_000, false),
            Err(CoinError::InvalidRewardRate(10_001))
        ));
        assert!(matches!(
            coin.quote_buy(1_000_000),
            Err(CoinError::InvalidRewardRate(10_001))
        ));
        assert_eq!(coin, before);
    }

    #[test]
    fn test_buy_overflowing_ledger() {
        let mut coin = CoinState::create(0);
        coin.init(u64::MAX - 10, 1_000_000_000_000).unwrap();
        let before = coin.clone();

        let result = coin.buy(u64::MAX / 2, false);
        assert!(matches!(result, Err(CoinError::Overflow(_))));
        assert_eq!(coin, before);

        // Previews never settle, so they still price
        assert!(coin.buy(u64::MAX / 2, true).is_ok());
    }

    #[test]
    fn test_zero_trade_amount() {
        let mut coin = CoinState::create(0);
        assert!(matches!(
            coin.buy(1, false),
            Err(CoinError::ZeroTradeAmount(1))
        ));
        assert!(coin.last_buy().is_none());
    }

    #[test]
    fn test_buy_minting_nothing_fails_cleanly() {
        let mut coin = CoinState::create(0);
        coin.init(1_000_000_000_000_000, 1000).unwrap();

        let result = coin.buy(2, false);
        assert!(matches!(result, Err(CoinError::DivisionByZero(_))));
        assert_eq!(coin.locked(), 1_000_000_000_000_000);
        assert_eq!(coin.supply(), 1000);
    }

    #[test]
    fn test_sell_zero_amount() {
        let mut coin = CoinState::create(0);
        coin.buy(1000, false).unwrap();
        assert!(matches!(
            coin.sell(0, false),
            Err(CoinError::DivisionByZero(_))
        ));
        assert_eq!(coin.supply(), 99_966_681);
    }

    #[test]
    fn test_adjust_sell_amount() {
        let mut coin = CoinState::create(0);

        assert_eq!(coin.adjust_sell_amount(95, 100), Ok(100));
        assert_eq!(coin.adjust_sell_amount(90, 100), Ok(90));
        assert_eq!(coin.adjust_sell_amount(100, 100), Ok(100));
        assert_eq!(
            coin.adjust_sell_amount(101, 100),
            Err(CoinError::InsufficientHeld {
                amount: 101,
                held: 100
            })
        );

        coin.set_strategy(Strategy::Watermark);
        assert_eq!(coin.adjust_sell_amount(95, 100), Ok(95));

        coin.set_strategy_by_height(20_000);
        assert_eq!(coin.strategy(), Strategy::Minting);

        let schedule = StrategySchedule {
            watermark_until: 30_000,
            minting_until: 40_000,
        };
        coin.set_strategy_by_schedule(&schedule, 20_000);
        assert_eq!(coin.strategy(), Strategy::Watermark);
        assert_eq!(coin.adjust_sell_amount(95, 100), Ok(95));
        coin.set_strategy_by_height(20_000);
        assert_eq!(coin.adjust_sell_amount(95, 100), Ok(100));
    }

    #[test]
    fn test_defaults() {
        let coin = CoinState::default();
        assert!(coin.is_creator());
        assert_eq!(coin.strategy(), Strategy::Reward);
        assert_eq!(coin.reward_basis_points(), 0);
        assert_eq!(coin.rate(), 0);
        assert!(coin.last_buy().is_none());
    }
}
