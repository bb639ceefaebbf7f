//! Semantic units and their fixed scales.
//!
//! A unit is a zero-sized marker type. Its scale (number of implied fractional
//! digits) is an associated constant, so two quantities of different units are
//! different Rust types and cannot be added by accident.

use super::value::DecimalValue;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// A named unit with a fixed, non-negative scale. The set of units is closed.
pub trait Unit:
    Scale + Copy + Debug + Default + PartialEq + Eq + PartialOrd + Ord + Hash + Send + Sync
{
    const DECIMALS: u32;
    const NAME: &'static str;
}

/// Effective scale of a calculator term. Named units report their own scale;
/// products and quotients combine scales symbolically and may go negative.
pub trait Scale: sealed::Sealed + 'static {
    const SCALE: i64;
}

/// Scale of `A * B`: sum of the operand scales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Product<A, B>(PhantomData<(A, B)>);

impl<A: Scale, B: Scale> sealed::Sealed for Product<A, B> {}

impl<A: Scale, B: Scale> Scale for Product<A, B> {
    const SCALE: i64 = A::SCALE + B::SCALE;
}

/// Scale of `A / B`: difference of the operand scales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Quotient<A, B>(PhantomData<(A, B)>);

impl<A: Scale, B: Scale> sealed::Sealed for Quotient<A, B> {}

impl<A: Scale, B: Scale> Scale for Quotient<A, B> {
    const SCALE: i64 = A::SCALE - B::SCALE;
}

macro_rules! define_unit {
    ($(#[$meta:meta])* $marker:ident => $alias:ident, $decimals:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $marker;

        impl sealed::Sealed for $marker {}

        impl Unit for $marker {
            const DECIMALS: u32 = $decimals;
            const NAME: &'static str = stringify!($alias);
        }

        impl Scale for $marker {
            const SCALE: i64 = $decimals;
        }

        pub type $alias = DecimalValue<$marker>;
    };
}

define_unit!(
    /// US dollar amounts: notional, equity, margin, unrealized PnL.
    Usd => UsdValue, 15
);
define_unit!(
    /// Oracle price of one unit of the index asset, quoted in USD.
    Price => OraclePrice, 18
);
define_unit!(
    /// Position size in index-asset units.
    Size => PositionSize, 18
);
define_unit!(
    /// On-chain collateral asset amounts.
    Collateral => CollateralAmount, 9
);
define_unit!(
    /// Fractions (0.05 for a 5% margin fraction) and percents (100 for 100%).
    Percentage => PercentageValue, 18
);
define_unit!(
    /// Dimensionless ratios such as leverage.
    Ratio => RatioOutput, 18
);
define_unit!(
    Funding => FundingRate, 18
);
define_unit!(
    Pnl => PnlDelta, 9
);
define_unit!(
    Realized => RealizedPnl, 9
);
define_unit!(
    /// Integer multiplier used to turn a fraction into a percent.
    Multiplier => PercentageMultiplier, 0
);

impl PercentageMultiplier {
    pub fn hundred() -> Self {
        Self::from_integer(100)
    }
}
