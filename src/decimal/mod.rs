//! 2.x fixed-point decimals: units, values and the deferred-rounding calculator.

pub mod calculator;
pub mod unit;
pub mod value;

pub use calculator::{CalculatorError, DecimalCalculator, Formula, FormulaBuilder, Fraction};
pub use unit::*;
pub use value::{DecimalError, DecimalValue};
