//! Margin requirements from a market's margin fractions.
//!
//! Initial margin (IM) is required to open a position; maintenance margin
//! (MM) is the minimum to keep it open. Both are a fraction of notional.

use crate::decimal::{DecimalCalculator, Ratio, RatioOutput, Usd, UsdValue};
use crate::market::MarketConfig;

pub fn initial_margin(notional: &UsdValue, config: &MarketConfig) -> UsdValue {
    DecimalCalculator::first(notional)
        .multiply_by(&config.initial_margin_fraction)
        .calculate::<Usd>()
}

pub fn maintenance_margin(notional: &UsdValue, config: &MarketConfig) -> UsdValue {
    DecimalCalculator::first(notional)
        .multiply_by(&config.maintenance_margin_fraction)
        .calculate::<Usd>()
}

/// `1 / initial_margin_fraction`, zero for a zero fraction.
pub fn max_leverage(config: &MarketConfig) -> RatioOutput {
    if config.initial_margin_fraction.is_zero() {
        tracing::trace!(market = %config.id, "max leverage: zero initial margin fraction");
        return RatioOutput::zero();
    }
    DecimalCalculator::first(&RatioOutput::from_integer(1))
        .divide_by(&config.initial_margin_fraction)
        .calculate::<Ratio>()
        .unwrap_or_default()
}
