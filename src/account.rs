//! Account-level aggregation.
//!
//! Positions are grouped by [`PositionKey`](crate::position::PositionKey) and
//! each group is valued at its index asset's oracle price. A group whose price
//! is missing is left out of the totals instead of failing the whole account.

use crate::decimal::{
    DecimalCalculator, OraclePrice, Percentage, PercentageMultiplier, PercentageValue, Ratio,
    RatioOutput, UsdValue,
};
use crate::metrics::{notional, unrealized_pnl};
use crate::position::{group_by_key, Position};
use crate::sources::OraclePrices;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetrics {
    pub equity: UsdValue,
    pub total_notional: UsdValue,
    pub account_leverage: RatioOutput,
    pub margin_usage: PercentageValue,
}

// sums `metric` over every priced group
fn sum_over_groups<P, F>(positions: &[P], oracle_prices: &OraclePrices, metric: F) -> UsdValue
where
    P: Borrow<Position>,
    F: Fn(&[&Position], &OraclePrice) -> UsdValue,
{
    let mut total = UsdValue::zero();
    for (key, group) in group_by_key(positions) {
        let latest = group.iter().filter(|p| p.latest).count();
        if latest > 1 {
            tracing::warn!(
                account = %key.account,
                asset = %key.index_asset_id,
                is_long = key.is_long,
                latest,
                "position history has more than one latest revision"
            );
        }
        let Some(price) = oracle_prices.get(&key.index_asset_id) else {
            tracing::debug!(
                account = %key.account,
                asset = %key.index_asset_id,
                "no oracle price, skipping position group"
            );
            continue;
        };
        total = total + metric(&group, price);
    }
    total
}

/// `collateral_balance` plus the unrealized PnL of every priced group.
pub fn account_equity<P: Borrow<Position>>(
    positions: &[P],
    collateral_balance: &UsdValue,
    oracle_prices: &OraclePrices,
) -> UsdValue {
    let pnl = sum_over_groups(positions, oracle_prices, |group, price| unrealized_pnl(group, price));
    collateral_balance.clone() + pnl
}

pub fn account_total_notional<P: Borrow<Position>>(
    positions: &[P],
    oracle_prices: &OraclePrices,
) -> UsdValue {
    sum_over_groups(positions, oracle_prices, |group, price| notional(group, price))
}

/// `total_notional / equity`, zero when equity is not positive.
pub fn account_leverage(total_notional: &UsdValue, equity: &UsdValue) -> RatioOutput {
    if !equity.is_positive() {
        tracing::trace!(%equity, "account leverage: non-positive equity");
        return RatioOutput::zero();
    }
    DecimalCalculator::first(total_notional)
        .divide_by(equity)
        .calculate::<Ratio>()
        .unwrap_or_default()
}

/// `used_margin * 100 / total_margin`, zero when total margin is not positive.
pub fn margin_usage(used_margin: &UsdValue, total_margin: &UsdValue) -> PercentageValue {
    if !total_margin.is_positive() {
        tracing::trace!(%total_margin, "margin usage: non-positive total margin");
        return PercentageValue::zero();
    }
    DecimalCalculator::first(used_margin)
        .multiply_by(&PercentageMultiplier::hundred())
        .divide_by(total_margin)
        .calculate::<Percentage>()
        .unwrap_or_default()
}

/// All account metrics at once. Total margin is the account equity.
pub fn account_metrics<P: Borrow<Position>>(
    positions: &[P],
    collateral_balance: &UsdValue,
    oracle_prices: &OraclePrices,
    used_margin: &UsdValue,
) -> AccountMetrics {
    let equity = account_equity(positions, collateral_balance, oracle_prices);
    let total_notional = account_total_notional(positions, oracle_prices);
    AccountMetrics {
        account_leverage: account_leverage(&total_notional, &equity),
        margin_usage: margin_usage(used_margin, &equity),
        equity,
        total_notional,
    }
}
