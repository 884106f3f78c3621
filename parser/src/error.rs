//! FILENAME: parser/src/error.rs
//! PURPOSE: The four error kinds spec §7 requires, shared by both dialects.

use thiserror::Error;

/// Surfaced when the lexer/parser cannot turn source text into an AST.
/// Carries the line the lexer/parser was on when it gave up, matching the
/// `\tFrom file {site} on line {l}` suffix the debugger prints for runtime
/// errors (parse errors reuse the same site/line vocabulary).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (line {line})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Raised by `Value`'s double-dispatch arithmetic when an operation is
/// applied to a type it doesn't support (`"Error adding Float to String"`).
/// Recoverable: a script can catch it the same way it catches any other
/// evaluation error surfaced through the debugger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TypedOperationException(pub String);

impl TypedOperationException {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// An error that aborts the whole evaluation — wrong argument count,
/// reading an uninitialized slot, index out of bounds. Unlike
/// `TypedOperationException` this is not meant to be caught by ordinary
/// script logic; it only unwinds to the debugger or the caller of `Eval`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct FatalException(pub String);

impl FatalException {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Indicates a bug in the interpreter itself (an invariant the tree-walker
/// assumed was upheld wasn't) rather than anything a script author could
/// have done differently. Never expected to surface in a correct build.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("internal error: {0}")]
pub struct ProgrammingException(pub String);

impl ProgrammingException {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Any error an expression evaluation can raise, unified so callers that
/// just want to propagate with `?` don't have to match on which of the
/// four kinds occurred.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error(transparent)]
    Typed(#[from] TypedOperationException),
    #[error(transparent)]
    Fatal(#[from] FatalException),
    #[error(transparent)]
    Programming(#[from] ProgrammingException),
}
