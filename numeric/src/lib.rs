//! FILENAME: numeric/src/lib.rs
//! PURPOSE: Arbitrary-precision number tower (spec §4.1).
//! CONTEXT: `Number` is the backend-opaque value both the formula and
//! scripting dialects use for every numeric literal and arithmetic result.
//! The concrete backend (`rust_decimal::Decimal`) is an implementation
//! detail; callers only see `Number`, `RoundingMode`, and `NumericEnvironment`.

mod environment;
mod number;
mod rounding;

pub use environment::NumericEnvironment;
pub use number::{Number, NumberError};
pub use rounding::RoundingMode;
