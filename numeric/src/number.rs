//! FILENAME: numeric/src/number.rs
//! PURPOSE: `Number`, the backend-opaque arbitrary-precision value (spec §4.1).
//! CONTEXT: Wraps `rust_decimal::Decimal` and adds the NaN/±Infinity states
//! decimal floats need but `Decimal` itself doesn't represent. Every
//! arithmetic operation here mirrors the quirks the rest of the system
//! depends on: divide-by-zero produces a signed infinity, 0/0 is NaN, and
//! a total order exists even across NaN so `Value` can sort and hash
//! numbers unconditionally.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::environment::NumericEnvironment;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Repr {
    Finite(Decimal),
    NaN,
    Inf { negative: bool },
}

/// A decimal number carrying its own display/rounding precision. `precision`
/// of `0` means "as many fractional digits as the value naturally has";
/// any other value is the fixed number of fractional digits `round` and
/// `to_string` use for this particular number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Number {
    repr: Repr,
    precision: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumberError {
    #[error("could not parse \"{0}\" as a number")]
    InvalidLiteral(String),
}

impl Number {
    pub fn zero(precision: u32) -> Self {
        Self {
            repr: Repr::Finite(Decimal::ZERO),
            precision,
        }
    }

    pub fn from_i64(value: i64, precision: u32) -> Self {
        Self {
            repr: Repr::Finite(Decimal::from(value)),
            precision,
        }
    }

    pub fn nan(precision: u32) -> Self {
        Self {
            repr: Repr::NaN,
            precision,
        }
    }

    pub fn infinity(negative: bool, precision: u32) -> Self {
        Self {
            repr: Repr::Inf { negative },
            precision,
        }
    }

    pub fn from_decimal(value: Decimal, precision: u32) -> Self {
        Self {
            repr: Repr::Finite(value),
            precision,
        }
    }

    /// Parses a literal at the given display precision. Accepts the tokens
    /// a lexer would hand it (`"NaN"`, `"Infinity"`, `"-Infinity"`) in
    /// addition to ordinary decimal literals.
    pub fn from_string(text: &str, precision: u32) -> Result<Self, NumberError> {
        let trimmed = text.trim();
        match trimmed {
            "NaN" | "nan" => return Ok(Self::nan(precision)),
            "Infinity" | "inf" => return Ok(Self::infinity(false, precision)),
            "-Infinity" | "-inf" => return Ok(Self::infinity(true, precision)),
            _ => {}
        }
        let value = trimmed
            .parse::<Decimal>()
            .map_err(|_| NumberError::InvalidLiteral(trimmed.to_string()))?;
        Ok(Self::from_decimal(value, precision))
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn change_precision(&self, precision: u32) -> Self {
        Self {
            repr: self.repr,
            precision,
        }
    }

    /// An explicit copy, matching the original's `duplicate()` vocabulary
    /// for "give me an independent value with the same contents."
    pub fn duplicate(&self) -> Self {
        *self
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.repr, Repr::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.repr, Repr::Inf { .. })
    }

    pub fn is_finite(&self) -> bool {
        matches!(self.repr, Repr::Finite(_))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.repr, Repr::Finite(d) if d.is_zero())
    }

    /// True for anything printed with a leading minus: negative finite
    /// values, negative zero, and negative infinity. NaN is never signed.
    pub fn is_signed(&self) -> bool {
        match self.repr {
            Repr::Finite(d) => d.is_sign_negative(),
            Repr::Inf { negative } => negative,
            Repr::NaN => false,
        }
    }

    pub fn neg(&self) -> Self {
        let repr = match self.repr {
            Repr::Finite(d) => Repr::Finite(-d),
            Repr::Inf { negative } => Repr::Inf { negative: !negative },
            Repr::NaN => Repr::NaN,
        };
        Self {
            repr,
            precision: self.precision,
        }
    }

    pub fn abs(&self) -> Self {
        if self.is_signed() {
            self.neg()
        } else {
            *self
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self.repr {
            Repr::Finite(d) => d.try_into().unwrap_or(f64::NAN),
            Repr::NaN => f64::NAN,
            Repr::Inf { negative: false } => f64::INFINITY,
            Repr::Inf { negative: true } => f64::NEG_INFINITY,
        }
    }

    fn combine_precision(&self, other: &Self, env: &NumericEnvironment) -> u32 {
        let default = env.default_precision();
        if default != 0 {
            default
        } else {
            self.precision.max(other.precision)
        }
    }

    fn round_result(value: Decimal, precision: u32, env: &NumericEnvironment) -> Decimal {
        if precision == 0 {
            value
        } else {
            value.round_dp_with_strategy(precision, env.rounding_mode().as_strategy())
        }
    }

    pub fn add(&self, other: &Self, env: &NumericEnvironment) -> Self {
        let precision = self.combine_precision(other, env);
        let repr = match (self.repr, other.repr) {
            (Repr::NaN, _) | (_, Repr::NaN) => Repr::NaN,
            (Repr::Inf { negative: a }, Repr::Inf { negative: b }) => {
                if a == b {
                    Repr::Inf { negative: a }
                } else {
                    Repr::NaN
                }
            }
            (Repr::Inf { negative }, Repr::Finite(_)) | (Repr::Finite(_), Repr::Inf { negative }) => {
                Repr::Inf { negative }
            }
            (Repr::Finite(a), Repr::Finite(b)) => Repr::Finite(Self::round_result(a + b, precision, env)),
        };
        Self { repr, precision }
    }

    pub fn sub(&self, other: &Self, env: &NumericEnvironment) -> Self {
        self.add(&other.neg(), env)
    }

    pub fn mul(&self, other: &Self, env: &NumericEnvironment) -> Self {
        let precision = self.combine_precision(other, env);
        let repr = match (self.repr, other.repr) {
            (Repr::NaN, _) | (_, Repr::NaN) => Repr::NaN,
            (Repr::Inf { negative: a }, Repr::Inf { negative: b }) => Repr::Inf { negative: a != b },
            (Repr::Inf { negative }, Repr::Finite(d)) | (Repr::Finite(d), Repr::Inf { negative }) => {
                if d.is_zero() {
                    Repr::NaN
                } else {
                    Repr::Inf {
                        negative: negative != d.is_sign_negative(),
                    }
                }
            }
            (Repr::Finite(a), Repr::Finite(b)) => Repr::Finite(Self::round_result(a * b, precision, env)),
        };
        Self { repr, precision }
    }

    /// Division by zero produces a signed infinity unless the numerator is
    /// also zero, in which case the result is NaN — matching IEEE-754
    /// float semantics rather than raising an error.
    pub fn div(&self, other: &Self, env: &NumericEnvironment) -> Self {
        let precision = self.combine_precision(other, env);
        let repr = match (self.repr, other.repr) {
            (Repr::NaN, _) | (_, Repr::NaN) => Repr::NaN,
            (Repr::Inf { .. }, Repr::Inf { .. }) => Repr::NaN,
            (Repr::Inf { negative }, Repr::Finite(d)) => Repr::Inf {
                negative: negative != d.is_sign_negative(),
            },
            (Repr::Finite(_), Repr::Inf { .. }) => Repr::Finite(Decimal::ZERO),
            (Repr::Finite(a), Repr::Finite(b)) => {
                if b.is_zero() {
                    if a.is_zero() {
                        Repr::NaN
                    } else {
                        Repr::Inf {
                            negative: a.is_sign_negative(),
                        }
                    }
                } else {
                    Repr::Finite(Self::round_result(a / b, precision, env))
                }
            }
        };
        Self { repr, precision }
    }

    pub fn round(&self, env: &NumericEnvironment) -> Self {
        let precision = if self.precision != 0 {
            self.precision
        } else {
            env.default_precision()
        };
        match self.repr {
            Repr::Finite(d) if precision != 0 => Self {
                repr: Repr::Finite(d.round_dp_with_strategy(precision, env.rounding_mode().as_strategy())),
                precision: self.precision,
            },
            _ => *self,
        }
    }

    pub fn floor(&self) -> Self {
        match self.repr {
            Repr::Finite(d) => Self {
                repr: Repr::Finite(d.floor()),
                precision: self.precision,
            },
            _ => *self,
        }
    }

    pub fn ceil(&self) -> Self {
        match self.repr {
            Repr::Finite(d) => Self {
                repr: Repr::Finite(d.ceiling()),
                precision: self.precision,
            },
            _ => *self,
        }
    }

    /// Total order across NaN/Infinity/finite values: `-Inf < finite <
    /// +Inf < NaN`, with NaN comparing equal to NaN. This lets `Value`
    /// sort and hash numbers (`Find`, dictionary keys, array sort helpers)
    /// without special-casing the non-finite states at every call site.
    fn rank(&self) -> i8 {
        match self.repr {
            Repr::Inf { negative: true } => -2,
            Repr::Finite(_) => 0,
            Repr::Inf { negative: false } => 2,
            Repr::NaN => 3,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.repr, other.repr) {
            (Repr::Finite(a), Repr::Finite(b)) => a.cmp(&b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for Number {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self.repr {
            Repr::Finite(d) => d.normalize().hash(state),
            Repr::NaN => "NaN".hash(state),
            Repr::Inf { negative } => (negative, "Inf").hash(state),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            Repr::NaN => write!(f, "NaN"),
            Repr::Inf { negative: false } => write!(f, "Infinity"),
            Repr::Inf { negative: true } => write!(f, "-Infinity"),
            Repr::Finite(d) => {
                if self.precision == 0 {
                    write!(f, "{d}")
                } else {
                    write!(f, "{}", d.round_dp(self.precision))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(default_precision: u32) -> NumericEnvironment {
        NumericEnvironment::new(default_precision, crate::RoundingMode::TiesToEven)
    }

    #[test]
    fn zero_over_zero_is_nan() {
        let env = env_with(0);
        let zero = Number::zero(0);
        assert!(zero.div(&zero, &env).is_nan());
    }

    #[test]
    fn nonzero_over_zero_is_signed_infinity() {
        let env = env_with(0);
        let one = Number::from_i64(1, 0);
        let neg_one = Number::from_i64(-1, 0);
        let zero = Number::zero(0);
        assert!(one.div(&zero, &env).is_infinite());
        assert!(!one.div(&zero, &env).is_signed());
        assert!(neg_one.div(&zero, &env).is_signed());
    }

    #[test]
    fn division_rounds_to_default_precision() {
        let env = env_with(1);
        let nine = Number::from_i64(9, 0);
        let six = Number::from_i64(6, 0);
        assert_eq!(nine.div(&six, &env).to_string(), "1.5");
    }

    #[test]
    fn addition_propagates_nan() {
        let env = env_with(0);
        let nan = Number::nan(0);
        let one = Number::from_i64(1, 0);
        assert!(one.add(&nan, &env).is_nan());
    }

    #[test]
    fn opposite_infinities_sum_to_nan() {
        let env = env_with(0);
        let pos = Number::infinity(false, 0);
        let neg = Number::infinity(true, 0);
        assert!(pos.add(&neg, &env).is_nan());
    }

    #[test]
    fn total_order_places_nan_last() {
        let neg_inf = Number::infinity(true, 0);
        let finite = Number::from_i64(5, 0);
        let pos_inf = Number::infinity(false, 0);
        let nan = Number::nan(0);
        assert!(neg_inf < finite);
        assert!(finite < pos_inf);
        assert!(pos_inf < nan);
        assert_eq!(nan.cmp(&Number::nan(0)), Ordering::Equal);
    }

    #[test]
    fn round_trips_through_display_and_parse() {
        let value = Number::from_string("42.5", 0).unwrap();
        assert_eq!(value.to_string(), "42.5");
    }

    #[test]
    fn parses_nan_and_infinity_literals() {
        assert!(Number::from_string("NaN", 0).unwrap().is_nan());
        assert!(Number::from_string("Infinity", 0).unwrap().is_infinite());
        assert!(Number::from_string("-Infinity", 0).unwrap().is_signed());
    }

    #[test]
    fn rejects_garbage_literals() {
        assert!(Number::from_string("not a number", 0).is_err());
    }

    #[test]
    fn floor_and_ceil_ignore_precision() {
        let value = Number::from_string("1.7", 2).unwrap();
        assert_eq!(value.floor().to_string(), "1");
        assert_eq!(value.ceil().to_string(), "2");
    }
}
