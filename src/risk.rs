// 6.0: position risk. health against maintenance margin, liquidation price,
// and the combined RiskMetrics record.
// 6.1 liquidation_price divides once: all numerator terms are combined at full
// precision before the single rounding step.

use crate::decimal::{
    CollateralAmount, DecimalCalculator, OraclePrice, Percentage, PercentageMultiplier,
    PercentageValue, PositionSize, Price, RatioOutput, Size, Usd, UsdValue,
};
use crate::margin::{initial_margin, maintenance_margin, max_leverage};
use crate::market::MarketConfig;
use crate::position::{latest_of, Position, PositionSide};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub initial_margin: UsdValue,
    pub maintenance_margin: UsdValue,
    pub max_leverage: RatioOutput,
    pub position_health: PercentageValue,
}

/// `min(equity / maintenance_margin, 1) * 100`. Zero when either input is not
/// positive, so the result is always within `[0, 100]`.
pub fn position_health(equity: &UsdValue, maintenance_margin: &UsdValue) -> PercentageValue {
    if !equity.is_positive() || !maintenance_margin.is_positive() {
        tracing::trace!(%equity, %maintenance_margin, "health: degenerate inputs");
        return PercentageValue::zero();
    }
    let cap = PercentageValue::from_integer(100);
    let health = DecimalCalculator::first(equity)
        .multiply_by(&PercentageMultiplier::hundred())
        .divide_by(maintenance_margin)
        .calculate::<Percentage>()
        .unwrap_or_default();
    health.min(cap)
}

// 6.1: (equity - other_positions_risk - collateral) / (|size| * (1 +/- mmf))
pub fn liquidation_price<P: Borrow<Position>>(
    history: &[P],
    equity: &UsdValue,
    config: &MarketConfig,
    other_positions_risk: &UsdValue,
) -> OraclePrice {
    let Some(current) = latest_of(history) else {
        return OraclePrice::zero();
    };
    let size = current.size.abs();
    if size.is_zero() {
        tracing::trace!("liquidation price: empty position");
        return OraclePrice::zero();
    }

    let one = PercentageValue::from_integer(1);
    let mmf = &config.maintenance_margin_fraction;
    let coefficient = match current.side() {
        PositionSide::Long => DecimalCalculator::first(&one).add(mmf),
        PositionSide::Short => DecimalCalculator::first(&one).subtract_by(mmf),
    };
    let collateral = current.collateral_amount.rescale::<Usd>();

    let fraction = DecimalCalculator::in_numerator(|n| {
        n.value(equity)
            .subtract_by(other_positions_risk)
            .subtract_by(&collateral)
    })
    .in_denominator(|d| d.value(&size).multiply_by_term(coefficient));
    if fraction.is_denominator_zero() {
        // short with a maintenance fraction of 1
        tracing::trace!(%mmf, "liquidation price: zero denominator");
        return OraclePrice::zero();
    }
    fraction.calculate::<Price>().unwrap_or_default()
}

/// Entry-price estimate that ignores other positions:
/// long `entry * (1 - collateral/size + 1/max_leverage)`,
/// short `entry * (1 + collateral/size - 1/max_leverage)`.
///
/// `size` and `collateral` are in the same quote terms. Returns zero for a
/// non-positive size, entry price or max leverage, and never goes below zero.
pub fn liquidation_price_approx(
    side: PositionSide,
    size: &PositionSize,
    collateral: &CollateralAmount,
    entry_price: &OraclePrice,
    max_leverage: &RatioOutput,
) -> OraclePrice {
    if !size.is_positive() || !entry_price.is_positive() || !max_leverage.is_positive() {
        tracing::trace!(%size, %entry_price, %max_leverage, "approx liquidation: degenerate inputs");
        return OraclePrice::zero();
    }

    // multiply through by size * max_leverage so the only division is the last
    let collateral = collateral.rescale::<Size>();
    let one = RatioOutput::from_integer(1);
    let size_lev = DecimalCalculator::first(size).multiply_by(max_leverage);
    let collateral_lev = DecimalCalculator::first(&collateral).multiply_by(max_leverage);
    let size_one = DecimalCalculator::first(size).multiply_by(&one);

    let factor = match side {
        PositionSide::Long => size_lev.subtract_term(collateral_lev).add_term(size_one),
        PositionSide::Short => size_lev.add_term(collateral_lev).subtract_term(size_one),
    };

    let price = factor
        .then()
        .multiply_by(entry_price)
        .in_denominator(|d| d.value(size).multiply_by(max_leverage))
        .calculate::<Price>()
        .unwrap_or_default();
    price.max(OraclePrice::zero())
}

pub fn risk_metrics(notional: &UsdValue, equity: &UsdValue, config: &MarketConfig) -> RiskMetrics {
    let maintenance = maintenance_margin(notional, config);
    RiskMetrics {
        initial_margin: initial_margin(notional, config),
        position_health: position_health(equity, &maintenance),
        maintenance_margin: maintenance,
        max_leverage: max_leverage(config),
    }
}
