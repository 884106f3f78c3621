//! FILENAME: parser/src/ast.rs
//! PURPOSE: Shared AST for both dialects.
//! CONTEXT: Forward (formulas) produces `Expression` trees only. Backward
//! (scripts) produces `Statement` trees whose leaves are the same
//! `Expression` nodes — the two dialects differ in grammar, not in the
//! tree they build or the `Value` they evaluate to.

use crate::value::{CellAddress, CellRangeValue, Value};

/// A reference to one of the standard library's built-in names, resolved
/// once at parse time instead of string-compared on every call — the same
/// trick the formula grammar used for its aggregate/math/text functions,
/// generalized to the much larger surface spec §2 lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdlibFn {
    NewArray,
    NewDictionary,
    NewArrayDefault,
    PushBack,
    PushFront,
    PopBack,
    PopFront,
    GetIndex,
    SetIndex,
    Insert,
    GetValue,
    ContainsKey,
    RemoveKey,
    GetKeys,
    Size,
    Length,
    SubString,
    ToString,
    ValueOf,
    FromCharacter,
    ToCharacter,
    Min,
    Max,
    NaN,
    Abs,
    Round,
    Floor,
    Ceil,
    Sqr,
    IsInfinity,
    IsNaN,
    IsFloat,
    IsString,
    IsArray,
    IsDictionary,
    IsFunction,
    IsNil,
    IsCellRef,
    IsCellRange,
    SetRoundMode,
    GetRoundMode,
    SetDefaultPrecision,
    GetDefaultPrecision,
    GetPrecision,
    SetPrecision,
    EnterDebugger,
    EvalCell,
    ExpandRange,
}

impl StdlibFn {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "NewArray" => Self::NewArray,
            "NewDictionary" => Self::NewDictionary,
            "NewArrayDefault" => Self::NewArrayDefault,
            "PushBack" => Self::PushBack,
            "PushFront" => Self::PushFront,
            "PopBack" => Self::PopBack,
            "PopFront" => Self::PopFront,
            "GetIndex" => Self::GetIndex,
            "SetIndex" => Self::SetIndex,
            "Insert" => Self::Insert,
            "GetValue" => Self::GetValue,
            "ContainsKey" => Self::ContainsKey,
            "RemoveKey" => Self::RemoveKey,
            "GetKeys" => Self::GetKeys,
            "Size" => Self::Size,
            "Length" => Self::Length,
            "SubString" => Self::SubString,
            "ToString" => Self::ToString,
            "ValueOf" => Self::ValueOf,
            "FromCharacter" => Self::FromCharacter,
            "ToCharacter" => Self::ToCharacter,
            "Min" => Self::Min,
            "Max" => Self::Max,
            "NaN" => Self::NaN,
            "Abs" => Self::Abs,
            "Round" => Self::Round,
            "Floor" => Self::Floor,
            "Ceil" => Self::Ceil,
            "Sqr" => Self::Sqr,
            "IsInfinity" => Self::IsInfinity,
            "IsNaN" => Self::IsNaN,
            "IsFloat" => Self::IsFloat,
            "IsString" => Self::IsString,
            "IsArray" => Self::IsArray,
            "IsDictionary" => Self::IsDictionary,
            "IsFunction" => Self::IsFunction,
            "IsNil" => Self::IsNil,
            "IsCellRef" => Self::IsCellRef,
            "IsCellRange" => Self::IsCellRange,
            "SetRoundMode" => Self::SetRoundMode,
            "GetRoundMode" => Self::GetRoundMode,
            "SetDefaultPrecision" => Self::SetDefaultPrecision,
            "GetDefaultPrecision" => Self::GetDefaultPrecision,
            "GetPrecision" => Self::GetPrecision,
            "SetPrecision" => Self::SetPrecision,
            "EnterDebugger" => Self::EnterDebugger,
            "EvalCell" => Self::EvalCell,
            "ExpandRange" => Self::ExpandRange,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Concat => "&",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
        };
        write!(f, "{s}")
    }
}

/// A function literal's static definition — the part that never changes
/// once parsed. The captures a given *instance* closed over live on
/// `FunctionValue` (parser::value), not here.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub params: Vec<String>,
    /// Capture expressions evaluated once, at the function literal's
    /// definition site, and bound into every call's scope under these
    /// names (spec §4.4 `BuildFunction`).
    pub captures: Vec<(String, Expression)>,
    pub body: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Identifier(String),
    CellRef(CellAddress),
    CellRange(CellRangeValue),
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    /// A call to a parse-time-resolved standard library function.
    StdlibCall {
        func: StdlibFn,
        args: Vec<Expression>,
        line: usize,
    },
    /// A call through an arbitrary expression (a variable holding a
    /// `Function` value, or a named user-defined function).
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
        line: usize,
    },
    FunctionLiteral(std::rc::Rc<FunctionLiteral>),
    ArrayLiteral(Vec<Expression>),
    DictionaryLiteral(Vec<(Expression, Expression)>),
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
}

/// One `case` arm of a `select` block (spec §4.4, §6.5). The guard decides
/// whether this arm's body runs for the selected value: `Is` matches by
/// equality, `Above`/`Below` by ordering, and `Also` adds another value to
/// the arm immediately preceding it (so `case 1 also 2 is ...` runs for
/// either).
#[derive(Debug, Clone, PartialEq)]
pub enum CaseGuard {
    Is(Expression),
    Above(Expression),
    Below(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseArm {
    pub guards: Vec<CaseGuard>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expr(Expression),
    VarDecl {
        name: String,
        value: Option<Expression>,
    },
    Assign {
        target: Expression,
        value: Expression,
    },
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    /// `for V in ARRAY do ... end` — iterates an Array's elements or a
    /// Dictionary's keys, snapshotting the container once at loop start
    /// (spec §9: mid-iteration mutation of the source isn't observed).
    ForEach {
        var: String,
        iterable: Expression,
        body: Vec<Statement>,
    },
    /// `for V from A to B step S do ... end` / `for V from A downto B step S do ... end`.
    ForRange {
        var: String,
        from: Expression,
        to: Expression,
        step: Option<Expression>,
        downto: bool,
        body: Vec<Statement>,
    },
    /// `select X from case ... end` (spec §4.4, §6.5).
    SelectBlock {
        selector: Expression,
        arms: Vec<CaseArm>,
    },
    Return(Option<Expression>),
    /// `break N` / `continue N` — N defaults to 1 when omitted.
    Break(u32),
    Continue(u32),
}
