//! Deferred-rounding arithmetic over [`DecimalValue`]s.
//!
//! A formula carries an exact integer whose effective scale is tracked in its
//! type: multiplying adds the operand's scale, dividing subtracts it. Nothing
//! is rounded until `calculate`, which rescales to the target unit in a single
//! multiply-then-divide step, rounding half away from zero.
//!
//! Division is deferred too. `divide_by` / `in_denominator` move the formula
//! into a [`Fraction`] whose numerator and denominator are reduced
//! independently and divided exactly once, so a formula such as
//! `(equity - risk - collateral) / (size * (1 + mmf))` keeps every additive
//! term at full precision.
//!
//! The builder is a type-state machine: a `Fraction` has no `divide_by`, a
//! denominator builder must return a plain `Formula`, and a seeded formula has
//! no `value`. Misuse is a compile error rather than a runtime one.

use super::unit::{Product, Quotient, Scale, Unit};
use super::value::DecimalValue;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::marker::PhantomData;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculatorError {
    #[error("division by zero: denominator reduced to 0 (scale {denominator_scale})")]
    DivisionByZero { denominator_scale: i64 },
}

pub(crate) fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

/// `n / d` rounded half away from zero. `d` must be non-zero.
pub(crate) fn div_round_half_away(n: &BigInt, d: &BigInt) -> BigInt {
    let quotient = n / d;
    let remainder = n % d;
    if remainder.is_zero() {
        return quotient;
    }
    if remainder.abs() * 2u32 >= d.abs() {
        if n.is_negative() != d.is_negative() {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

// raw * 10^shift, or raw / 10^-shift rounded, for a non-negative or negative shift
fn shift_scale(raw: &BigInt, shift: i64) -> BigInt {
    if shift >= 0 {
        raw * pow10(shift as u32)
    } else {
        div_round_half_away(raw, &pow10(shift.unsigned_abs() as u32))
    }
}

/// Entry points of the builder.
pub struct DecimalCalculator;

impl DecimalCalculator {
    pub fn first<U: Unit>(value: &DecimalValue<U>) -> Formula<U> {
        Formula::seed(value)
    }

    pub fn value<U: Unit>(value: &DecimalValue<U>) -> Formula<U> {
        Formula::seed(value)
    }

    /// Builds the numerator in its own closure, for formulas that read better
    /// as `in_numerator(..).divide_by(..)`.
    pub fn in_numerator<S: Scale>(build: impl FnOnce(FormulaBuilder) -> Formula<S>) -> Formula<S> {
        build(FormulaBuilder)
    }
}

/// Handed to `in_numerator` / `in_denominator` closures to seed a sub-formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaBuilder;

impl FormulaBuilder {
    pub fn value<U: Unit>(self, value: &DecimalValue<U>) -> Formula<U> {
        Formula::seed(value)
    }
}

/// An exact intermediate with effective scale `S::SCALE`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a formula does nothing until `calculate` is called"]
pub struct Formula<S> {
    raw: BigInt,
    scale: PhantomData<S>,
}

impl<U: Unit> Formula<U> {
    fn seed(value: &DecimalValue<U>) -> Self {
        Self::from_raw(value.raw().clone())
    }

    pub fn add(self, y: &DecimalValue<U>) -> Self {
        Self::from_raw(self.raw + y.raw())
    }

    pub fn subtract_by(self, y: &DecimalValue<U>) -> Self {
        Self::from_raw(self.raw - y.raw())
    }
}

impl<S: Scale> Formula<S> {
    fn from_raw(raw: BigInt) -> Self {
        Self {
            raw,
            scale: PhantomData,
        }
    }

    /// Readability marker between operation groups. Does not round.
    pub fn then(self) -> Self {
        self
    }

    /// Adds another formula of the same effective scale, e.g. two products.
    pub fn add_term(self, other: Formula<S>) -> Self {
        Self::from_raw(self.raw + other.raw)
    }

    pub fn subtract_term(self, other: Formula<S>) -> Self {
        Self::from_raw(self.raw - other.raw)
    }

    pub fn multiply_by<V: Unit>(self, y: &DecimalValue<V>) -> Formula<Product<S, V>> {
        Formula::from_raw(self.raw * y.raw())
    }

    pub fn multiply_by_term<T: Scale>(self, other: Formula<T>) -> Formula<Product<S, T>> {
        Formula::from_raw(self.raw * other.raw)
    }

    pub fn divide_by<V: Unit>(self, y: &DecimalValue<V>) -> Fraction<S, V> {
        Fraction::new(self.raw, y.raw().clone())
    }

    /// Divides by a denominator built as its own sub-formula.
    pub fn in_denominator<D: Scale>(
        self,
        build: impl FnOnce(FormulaBuilder) -> Formula<D>,
    ) -> Fraction<S, D> {
        let denominator = build(FormulaBuilder);
        Fraction::new(self.raw, denominator.raw)
    }

    pub fn effective_scale(&self) -> i64 {
        S::SCALE
    }

    pub fn raw(&self) -> &BigInt {
        &self.raw
    }

    /// Rescales from `S::SCALE` to `T::DECIMALS`, rounding at most once.
    pub fn calculate<T: Unit>(self) -> DecimalValue<T> {
        let shift = i64::from(T::DECIMALS) - S::SCALE;
        DecimalValue::from_raw(shift_scale(&self.raw, shift))
    }
}

/// `numerator / denominator`, not yet divided.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a fraction does nothing until `calculate` is called"]
pub struct Fraction<N, D> {
    numerator: BigInt,
    denominator: BigInt,
    scales: PhantomData<(N, D)>,
}

impl<N: Scale, D: Scale> Fraction<N, D> {
    fn new(numerator: BigInt, denominator: BigInt) -> Self {
        Self {
            numerator,
            denominator,
            scales: PhantomData,
        }
    }

    pub fn then(self) -> Self {
        self
    }

    /// Scales the numerator. The division still happens once, at `calculate`.
    pub fn multiply_by<V: Unit>(self, y: &DecimalValue<V>) -> Fraction<Product<N, V>, D> {
        Fraction::new(self.numerator * y.raw(), self.denominator)
    }

    pub fn effective_scale(&self) -> i64 {
        <Quotient<N, D>>::SCALE
    }

    pub fn is_denominator_zero(&self) -> bool {
        self.denominator.is_zero()
    }

    /// `numerator * 10^(T + D - N) / denominator`, rounded half away from zero.
    pub fn calculate<T: Unit>(self) -> Result<DecimalValue<T>, CalculatorError> {
        if self.denominator.is_zero() {
            tracing::trace!(
                numerator_scale = N::SCALE,
                denominator_scale = D::SCALE,
                "fraction has zero denominator"
            );
            return Err(CalculatorError::DivisionByZero {
                denominator_scale: D::SCALE,
            });
        }
        let shift = i64::from(T::DECIMALS) + D::SCALE - N::SCALE;
        let raw = if shift >= 0 {
            div_round_half_away(&(self.numerator * pow10(shift as u32)), &self.denominator)
        } else {
            let denominator = self.denominator * pow10(shift.unsigned_abs() as u32);
            div_round_half_away(&self.numerator, &denominator)
        };
        Ok(DecimalValue::from_raw(raw))
    }
}
