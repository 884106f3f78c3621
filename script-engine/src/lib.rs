//! FILENAME: script-engine/src/lib.rs
//! PURPOSE: Library root for the shared tree-walking interpreter: scope
//! management, function calls, flow control, the interactive debugger,
//! and the standard library (spec §4.6-4.9, §4.8, §2).

pub mod context;
pub mod control;
pub mod debugger;
pub mod frame;
pub mod interpreter;
pub mod logger;
pub mod scope;
pub mod stdlib;

pub use context::{CallingContext, CellAccess};
pub use control::Flow;
pub use frame::StackFrame;
pub use interpreter::{call_function, eval_expression, exec_block, exec_statement};
pub use logger::{BufferedLogger, ConsoleLogger, Logger, NullLogger};
pub use scope::{LookupResult, Scope};
