//! FILENAME: numeric/src/rounding.rs
//! PURPOSE: Rounding-mode enum exposed to scripts as plain integers
//! (`SetRoundMode`/`GetRoundMode` in the standard library), backed by
//! `rust_decimal`'s `RoundingStrategy`.

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};

/// One of the rounding directions a script can select with `SetRoundMode`.
/// The integer values are the public, stable wire representation — scripts
/// and persisted workbooks reference modes by number, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum RoundingMode {
    TiesToEven = 0,
    TiesAwayFromZero = 1,
    TiesTowardZero = 2,
    TowardZero = 3,
    AwayFromZero = 4,
    TowardPositiveInfinity = 5,
    TowardNegativeInfinity = 6,
}

impl RoundingMode {
    pub const COUNT: i64 = 7;

    pub fn from_i64(mode: i64) -> Option<Self> {
        match mode {
            0 => Some(Self::TiesToEven),
            1 => Some(Self::TiesAwayFromZero),
            2 => Some(Self::TiesTowardZero),
            3 => Some(Self::TowardZero),
            4 => Some(Self::AwayFromZero),
            5 => Some(Self::TowardPositiveInfinity),
            6 => Some(Self::TowardNegativeInfinity),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub(crate) fn as_strategy(self) -> RoundingStrategy {
        match self {
            Self::TiesToEven => RoundingStrategy::MidpointNearestEven,
            Self::TiesAwayFromZero => RoundingStrategy::MidpointAwayFromZero,
            Self::TiesTowardZero => RoundingStrategy::MidpointTowardZero,
            Self::TowardZero => RoundingStrategy::ToZero,
            Self::AwayFromZero => RoundingStrategy::AwayFromZero,
            Self::TowardPositiveInfinity => RoundingStrategy::ToPositiveInfinity,
            Self::TowardNegativeInfinity => RoundingStrategy::ToNegativeInfinity,
        }
    }
}

impl Default for RoundingMode {
    fn default() -> Self {
        Self::TiesToEven
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_i64() {
        for mode in 0..RoundingMode::COUNT {
            let parsed = RoundingMode::from_i64(mode).unwrap();
            assert_eq!(parsed.as_i64(), mode);
        }
    }

    #[test]
    fn rejects_out_of_range_modes() {
        assert!(RoundingMode::from_i64(-1).is_none());
        assert!(RoundingMode::from_i64(RoundingMode::COUNT).is_none());
    }

    #[test]
    fn default_is_ties_to_even() {
        assert_eq!(RoundingMode::default(), RoundingMode::TiesToEven);
    }
}
