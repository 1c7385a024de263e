// src/decimal.rs

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Arbitrary-precision decimal extended with signed infinities.
///
/// Finite values are backed by `rust_decimal::Decimal` (96-bit mantissa, up to 28
/// fractional digits), so price comparisons never go through binary floating point.
/// The infinities exist because unset bounds default to `+∞` / `−∞` and because a
/// deviation measured against a zero current value is unbounded.
///
/// Variant order matters: the derived `Ord` gives `−∞ < finite < +∞`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecimalValue {
    NegInfinity,
    Finite(Decimal),
    PosInfinity,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("Not a number: {0:?}")]
    NotANumber(String),
    #[error("Indeterminate decimal operation")]
    Indeterminate,
    #[error("Decimal overflow")]
    Overflow,
    #[error("Infinite value has no fixed-point form")]
    NotFinite,
}

impl DecimalValue {
    pub const ZERO: DecimalValue = DecimalValue::Finite(Decimal::ZERO);

    pub fn parse(input: &str) -> Result<Self, DecimalError> {
        let trimmed = input.trim();
        match trimmed {
            "" => return Err(DecimalError::NotANumber(input.to_string())),
            "Infinity" | "+Infinity" | "inf" | "+inf" => return Ok(Self::PosInfinity),
            "-Infinity" | "-inf" => return Ok(Self::NegInfinity),
            _ => {}
        }

        // At most one sign.
        let unsigned = match trimmed.strip_prefix('+') {
            Some(rest) if rest.starts_with(['+', '-']) => {
                return Err(DecimalError::NotANumber(input.to_string()))
            }
            Some(rest) => rest,
            None => trimmed,
        };

        let parsed = if unsigned.contains(['e', 'E']) {
            Decimal::from_scientific(unsigned)
        } else {
            Decimal::from_str(unsigned)
        };
        parsed
            .map(Self::Finite)
            .map_err(|_| DecimalError::NotANumber(input.to_string()))
    }

    pub fn from_f64(value: f64) -> Result<Self, DecimalError> {
        if value.is_nan() {
            return Err(DecimalError::NotANumber("NaN".to_string()));
        }
        if value.is_infinite() {
            return Ok(if value > 0.0 { Self::PosInfinity } else { Self::NegInfinity });
        }
        // f64 Display never uses exponent notation, so this keeps the shortest
        // round-trip representation ("1.05", not 1.0500000000000000444).
        Self::parse(&value.to_string())
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, DecimalError> {
        match value {
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Finite(Decimal::from(i)))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::Finite(Decimal::from(u)))
                } else {
                    Self::parse(&n.to_string())
                }
            }
            other => Err(DecimalError::NotANumber(other.to_string())),
        }
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            Self::Finite(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Self::Finite(d) if d.is_zero())
    }

    fn signum(&self) -> i8 {
        match self {
            Self::NegInfinity => -1,
            Self::PosInfinity => 1,
            Self::Finite(d) if d.is_zero() => 0,
            Self::Finite(d) if d.is_sign_negative() => -1,
            Self::Finite(_) => 1,
        }
    }

    fn infinity_with_sign(sign: i8) -> Self {
        if sign < 0 {
            Self::NegInfinity
        } else {
            Self::PosInfinity
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Self::NegInfinity | Self::PosInfinity => Self::PosInfinity,
            Self::Finite(d) => Self::Finite(d.abs()),
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Self::NegInfinity => Self::PosInfinity,
            Self::PosInfinity => Self::NegInfinity,
            Self::Finite(d) => Self::Finite(-*d),
        }
    }

    pub fn checked_add(&self, rhs: &Self) -> Result<Self, DecimalError> {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => {
                a.checked_add(*b).map(Self::Finite).ok_or(DecimalError::Overflow)
            }
            (Self::PosInfinity, Self::NegInfinity) | (Self::NegInfinity, Self::PosInfinity) => {
                Err(DecimalError::Indeterminate)
            }
            (Self::Finite(_), inf) | (inf, _) => Ok(*inf),
        }
    }

    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, DecimalError> {
        self.checked_add(&rhs.neg())
    }

    pub fn checked_mul(&self, rhs: &Self) -> Result<Self, DecimalError> {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => {
                a.checked_mul(*b).map(Self::Finite).ok_or(DecimalError::Overflow)
            }
            _ => {
                let sign = self.signum() * rhs.signum();
                if sign == 0 {
                    Err(DecimalError::Indeterminate)
                } else {
                    Ok(Self::infinity_with_sign(sign))
                }
            }
        }
    }

    /// Division where a non-zero numerator over zero is a signed infinity.
    pub fn checked_div(&self, rhs: &Self) -> Result<Self, DecimalError> {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) if b.is_zero() => {
                if a.is_zero() {
                    Err(DecimalError::Indeterminate)
                } else {
                    Ok(Self::infinity_with_sign(self.signum()))
                }
            }
            (Self::Finite(a), Self::Finite(b)) => {
                a.checked_div(*b).map(Self::Finite).ok_or(DecimalError::Overflow)
            }
            (Self::Finite(_), _) => Ok(Self::ZERO),
            (_, Self::Finite(b)) => {
                let sign = self.signum() * if b.is_sign_negative() { -1 } else { 1 };
                Ok(Self::infinity_with_sign(sign))
            }
            _ => Err(DecimalError::Indeterminate),
        }
    }

    /// Fixed-point rendering with exactly `dp` fractional digits, half-up rounding.
    ///
    /// Infinities have no fixed-point form. Values whose integer part leaves no room for
    /// `dp` digits within the 96-bit mantissa fail with `Overflow`.
    pub fn to_fixed(&self, dp: u32) -> Result<String, DecimalError> {
        let d = self.finite().ok_or(DecimalError::NotFinite)?;
        let mut rounded = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            rounded.set_sign_positive(true);
        }
        // `rescale` lowers the scale instead of failing when the mantissa is too small.
        rounded.rescale(dp);
        if rounded.scale() != dp {
            return Err(DecimalError::Overflow);
        }
        Ok(rounded.to_string())
    }
}

impl Default for DecimalValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegInfinity => write!(f, "-Infinity"),
            Self::PosInfinity => write!(f, "Infinity"),
            Self::Finite(d) => {
                let mut normalized = d.normalize();
                if normalized.is_zero() {
                    normalized.set_sign_positive(true);
                }
                write!(f, "{}", normalized)
            }
        }
    }
}

impl FromStr for DecimalValue {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Decimal> for DecimalValue {
    fn from(value: Decimal) -> Self {
        Self::Finite(value)
    }
}

impl From<i64> for DecimalValue {
    fn from(value: i64) -> Self {
        Self::Finite(Decimal::from(value))
    }
}

impl PartialEq<Decimal> for DecimalValue {
    fn eq(&self, other: &Decimal) -> bool {
        matches!(self, Self::Finite(d) if d == other)
    }
}

impl PartialOrd<Decimal> for DecimalValue {
    fn partial_cmp(&self, other: &Decimal) -> Option<Ordering> {
        Some(self.cmp(&Self::Finite(*other)))
    }
}

impl Serialize for DecimalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DecimalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&raw).map_err(serde::de::Error::custom)
    }
}

/// Anything a validator accepts as a numeric input.
///
/// Parsing is deferred to validation time so that an unparsable input surfaces as a
/// validation failure for the field it belongs to.
pub trait DecimalInput {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError>;
}

impl DecimalInput for DecimalValue {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        Ok(*self)
    }
}

impl DecimalInput for Decimal {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        Ok(DecimalValue::Finite(*self))
    }
}

impl DecimalInput for str {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        DecimalValue::parse(self)
    }
}

impl DecimalInput for String {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        DecimalValue::parse(self)
    }
}

impl DecimalInput for serde_json::Value {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        DecimalValue::from_json(self)
    }
}

impl DecimalInput for i64 {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        Ok(DecimalValue::from(*self))
    }
}

impl DecimalInput for u64 {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        Decimal::from_u64(*self)
            .map(DecimalValue::Finite)
            .ok_or(DecimalError::Overflow)
    }
}

impl DecimalInput for f64 {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        DecimalValue::from_f64(*self)
    }
}

impl<T: DecimalInput> DecimalInput for Option<T> {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        match self {
            Some(inner) => inner.to_decimal(),
            None => Err(DecimalError::NotANumber("undefined".to_string())),
        }
    }
}

impl<T: DecimalInput + ?Sized> DecimalInput for &T {
    fn to_decimal(&self) -> Result<DecimalValue, DecimalError> {
        (**self).to_decimal()
    }
}
