//! FILENAME: script-engine/src/control.rs
//! PURPOSE: Flow-control signals (spec §4.9) propagated as return values
//! instead of exceptions — `break`/`continue`/`return` unwind exactly as
//! far as a loop or function boundary and no further.

use parser::Value;

#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    /// Carries the remaining depth to unwind (spec §4.9): `break 1` (the
    /// default) is consumed by the innermost loop; `break N` decrements at
    /// each enclosing loop boundary and keeps propagating while > 0.
    Break(u32),
    Continue(u32),
    Return(Value),
}
