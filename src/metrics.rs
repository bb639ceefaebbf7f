//! Per-position metrics against the current oracle price.
//!
//! Every function reads the latest revision of a position history and
//! returns zero rather than failing when the inputs are degenerate.

use crate::decimal::{
    DecimalCalculator, OraclePrice, Percentage, PercentageMultiplier, PercentageValue, Ratio,
    RatioOutput, Usd, UsdValue,
};
use crate::position::{latest_of, Position, PositionSide};
use std::borrow::Borrow;

/// `|size| * price` of the latest revision, zero without one.
pub fn notional<P: Borrow<Position>>(history: &[P], price: &OraclePrice) -> UsdValue {
    let Some(current) = latest_of(history) else {
        return UsdValue::zero();
    };
    DecimalCalculator::first(&current.size.abs())
        .multiply_by(price)
        .calculate::<Usd>()
}

/// Current value minus posted collateral for longs, the reverse for shorts.
pub fn unrealized_pnl<P: Borrow<Position>>(history: &[P], price: &OraclePrice) -> UsdValue {
    let Some(current) = latest_of(history) else {
        return UsdValue::zero();
    };
    let current_value = DecimalCalculator::first(&current.size.abs())
        .multiply_by(price)
        .calculate::<Usd>();
    let collateral = current.collateral_amount.rescale::<Usd>();

    match current.side() {
        PositionSide::Long => current_value - collateral,
        PositionSide::Short => collateral - current_value,
    }
}

/// PnL as a percent of `equity` (5% is 5), zero when equity is not positive.
pub fn unrealized_pnl_percent<P: Borrow<Position>>(
    history: &[P],
    equity: &UsdValue,
    price: &OraclePrice,
) -> PercentageValue {
    if !equity.is_positive() {
        tracing::trace!(%equity, "pnl percent: non-positive equity");
        return PercentageValue::zero();
    }
    let pnl = unrealized_pnl(history, price);
    DecimalCalculator::first(&pnl)
        .multiply_by(&PercentageMultiplier::hundred())
        .divide_by(equity)
        .calculate::<Percentage>()
        .unwrap_or_default()
}

/// `notional / equity`, zero when equity is not positive.
pub fn leverage<P: Borrow<Position>>(
    history: &[P],
    equity: &UsdValue,
    price: &OraclePrice,
) -> RatioOutput {
    if !equity.is_positive() {
        tracing::trace!(%equity, "leverage: non-positive equity");
        return RatioOutput::zero();
    }
    let notional = notional(history, price);
    DecimalCalculator::first(&notional)
        .divide_by(equity)
        .calculate::<Ratio>()
        .unwrap_or_default()
}
