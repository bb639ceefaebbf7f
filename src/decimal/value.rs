//! Fixed-point values: an arbitrary-precision integer of atomic units tagged
//! with the unit that fixes its scale.

use super::calculator::{div_round_half_away, pow10, DecimalCalculator};
use super::unit::Unit;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecimalError {
    #[error("invalid atomic amount {0:?}: expected an integer string")]
    InvalidRaw(String),

    #[error("cannot represent non-finite float {0}")]
    NonFinite(f64),

    #[error("float {0} is outside the representable decimal range")]
    OutOfRange(f64),
}

const RUST_DECIMAL_MAX_SCALE: u32 = 28;

/// `raw` atomic units of `U`, i.e. the number `raw / 10^U::DECIMALS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DecimalValue<U> {
    raw: BigInt,
    unit: PhantomData<U>,
}

impl<U: Unit> DecimalValue<U> {
    pub fn from_raw(raw: impl Into<BigInt>) -> Self {
        Self {
            raw: raw.into(),
            unit: PhantomData,
        }
    }

    pub fn zero() -> Self {
        Self::from_raw(0)
    }

    /// Whole number of units, e.g. `from_integer(5)` is 5.0.
    pub fn from_integer(n: i64) -> Self {
        Self::from_raw(BigInt::from(n) * pow10(U::DECIMALS))
    }

    /// `round(x * 10^DECIMALS)`, half away from zero. The float is read at its
    /// shortest decimal form first, so `from_float(0.1)` is exactly 0.1.
    ///
    /// Goes through `rust_decimal`, which holds 96 bits: `|x|` above about
    /// 7.9e28 is `OutOfRange`. Use `from_raw` for larger amounts.
    pub fn from_float(x: f64) -> Result<Self, DecimalError> {
        if !x.is_finite() {
            return Err(DecimalError::NonFinite(x));
        }
        let d = Decimal::from_f64(x).ok_or(DecimalError::OutOfRange(x))?;
        Ok(Self::from_decimal(d))
    }

    pub fn from_decimal(d: Decimal) -> Self {
        let mantissa = BigInt::from(d.mantissa());
        let scale = d.scale();
        let raw = if U::DECIMALS >= scale {
            mantissa * pow10(U::DECIMALS - scale)
        } else {
            div_round_half_away(&mantissa, &pow10(scale - U::DECIMALS))
        };
        Self::from_raw(raw)
    }

    /// Exact `rust_decimal` form, or `None` when the value does not fit in 96 bits.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let max_scale = RUST_DECIMAL_MAX_SCALE;
        let (raw, scale) = if U::DECIMALS > max_scale {
            let divisor = pow10(U::DECIMALS - max_scale);
            (div_round_half_away(&self.raw, &divisor), max_scale)
        } else {
            (self.raw.clone(), U::DECIMALS)
        };
        let mantissa = raw.to_i128()?;
        Decimal::try_from_i128_with_scale(mantissa, scale)
            .ok()
            .map(|d| d.normalize())
    }

    /// Lossy, for display only.
    pub fn to_float(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    pub fn raw(&self) -> &BigInt {
        &self.raw
    }

    pub fn decimals(&self) -> u32 {
        U::DECIMALS
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.raw.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.raw.is_negative()
    }

    pub fn abs(&self) -> Self {
        Self::from_raw(self.raw.abs())
    }

    /// Same quantity expressed in another unit's scale. Exact when `V` has at
    /// least as many decimals, otherwise rounded once.
    pub fn rescale<V: Unit>(&self) -> DecimalValue<V> {
        DecimalCalculator::first(self).calculate::<V>()
    }
}

// 2.1: same-unit arithmetic is plain integer arithmetic on the raw amounts

impl<U: Unit> Add for DecimalValue<U> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_raw(self.raw + rhs.raw)
    }
}

impl<'a, U: Unit> Add<&'a DecimalValue<U>> for DecimalValue<U> {
    type Output = Self;

    fn add(self, rhs: &'a DecimalValue<U>) -> Self {
        Self::from_raw(self.raw + &rhs.raw)
    }
}

impl<U: Unit> Sub for DecimalValue<U> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_raw(self.raw - rhs.raw)
    }
}

impl<'a, U: Unit> Sub<&'a DecimalValue<U>> for DecimalValue<U> {
    type Output = Self;

    fn sub(self, rhs: &'a DecimalValue<U>) -> Self {
        Self::from_raw(self.raw - &rhs.raw)
    }
}

impl<U: Unit> Neg for DecimalValue<U> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_raw(-self.raw)
    }
}

impl<U: Unit> Sum for DecimalValue<U> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, v| acc + v)
    }
}

impl<'a, U: Unit> Sum<&'a DecimalValue<U>> for DecimalValue<U> {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, v| acc + v)
    }
}

// exact decimal text, trailing zeros trimmed: 1500000 at 6 decimals is "1.5"
impl<U: Unit> fmt::Display for DecimalValue<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = U::DECIMALS as usize;
        let digits = self.raw.abs().to_string();
        let (int_part, frac_part) = if digits.len() > decimals {
            let (i, fr) = digits.split_at(digits.len() - decimals);
            (i.to_string(), fr.to_string())
        } else {
            ("0".to_string(), format!("{digits:0>decimals$}"))
        };
        let frac_part = frac_part.trim_end_matches('0');
        let sign = if self.raw.is_negative() { "-" } else { "" };
        if frac_part.is_empty() {
            write!(f, "{sign}{int_part}")
        } else {
            write!(f, "{sign}{int_part}.{frac_part}")
        }
    }
}

/// Parses an atomic-unit integer string, the form the indexer emits.
impl<U: Unit> FromStr for DecimalValue<U> {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigInt::from_str(s)
            .map(Self::from_raw)
            .map_err(|_| DecimalError::InvalidRaw(s.to_string()))
    }
}

impl<U: Unit> Serialize for DecimalValue<U> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.raw)
    }
}

struct DecimalValueVisitor<U>(PhantomData<U>);

impl<'de, U: Unit> Visitor<'de> for DecimalValueVisitor<U> {
    type Value = DecimalValue<U>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an atomic {} amount as a string, or a whole-unit number", U::NAME)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    // numbers are human amounts, not atomic units: 10 is 10.0
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(DecimalValue::from_integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(DecimalValue::from_raw(BigInt::from(v) * pow10(U::DECIMALS)))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
        Ok(DecimalValue::from_raw(BigInt::from(v) * pow10(U::DECIMALS)))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
        Ok(DecimalValue::from_raw(BigInt::from(v) * pow10(U::DECIMALS)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        DecimalValue::from_float(v).map_err(E::custom)
    }
}

impl<'de, U: Unit> Deserialize<'de> for DecimalValue<U> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalValueVisitor(PhantomData))
    }
}
