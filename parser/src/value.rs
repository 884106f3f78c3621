//! FILENAME: parser/src/value.rs
//! PURPOSE: The shared runtime value both dialects produce and consume
//! (spec §3 Values, §4.2 double dispatch).
//! CONTEXT: `Value` is intentionally a flat sum type with no dialect tag —
//! Forward and Backward evaluate the same `Expression` tree into the same
//! `Value`, so a cell formula and a script can hand values back and forth
//! (`EvalCell`, captured cell references) without a conversion layer.

use std::fmt;
use std::rc::Rc;

use numeric::Number;

use crate::ast::FunctionLiteral;
use crate::error::TypedOperationException;

/// A single spreadsheet coordinate. Columns are 0-indexed internally;
/// display (`A1`) conversion lives in `engine::coord`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    pub sheet: Option<String>,
    pub col: u32,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRangeValue {
    pub start: CellAddress,
    pub end: CellAddress,
}

/// A first-class function value: the static definition paired with the
/// captures evaluated at the point the function literal was built
/// (`BuildFunction` in spec §4.4 — captures are bound once, at definition,
/// not re-resolved on every call).
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub definition: Rc<FunctionLiteral>,
    /// Name-ordered the way the definition lists them, but looked up by
    /// name at call time — order only matters for `show`/backtrace display.
    pub captures: Rc<Vec<(String, Value)>>,
}

impl PartialEq for FunctionValue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.definition, &other.definition) && Rc::ptr_eq(&self.captures, &other.captures)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Number(Number),
    String(Rc<String>),
    /// Order-stable: equality, hashing, and display all respect index order.
    Array(Rc<Vec<Value>>),
    /// Order-independent: equality and hashing must not depend on insertion
    /// order, since two dictionaries built by different code paths but
    /// holding the same key/value pairs must compare equal.
    Dictionary(Rc<Vec<(Value, Value)>>),
    Function(FunctionValue),
    CellRef(CellAddress),
    CellRange(CellRangeValue),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Number(_) => "Float",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
            Value::Function(_) => "Function",
            Value::CellRef(_) => "CellRef",
            Value::CellRange(_) => "CellRange",
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Rc::new(s.into()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn dictionary(pairs: Vec<(Value, Value)>) -> Self {
        Value::Dictionary(Rc::new(pairs))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Number(n) => !n.is_zero() && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Dictionary(d) => !d.is_empty(),
            Value::Function(_) | Value::CellRef(_) | Value::CellRange(_) => true,
        }
    }

    fn type_error(op: &str, lhs: &Value, rhs: &Value) -> TypedOperationException {
        TypedOperationException::new(format!(
            "Error {op} {} to {}",
            lhs.type_name(),
            rhs.type_name()
        ))
    }

    /// Double-dispatch addition: numbers add, strings concatenate, and an
    /// Array or Dictionary paired with a scalar broadcasts the scalar
    /// element-wise. Array+Array is the deliberate, quirky case spec §4.2
    /// calls out: the left array becomes the outer array, and each of its
    /// elements is combined as `rhs.op(lhs_elem)` — so `{2} + {4}` produces
    /// `{ {6} }`, not `{6}`, because the whole right-hand array is broadcast
    /// against each left-hand element in turn via the scalar-broadcast arm
    /// below.
    pub fn add(&self, other: &Value, env: &numeric::NumericEnvironment) -> Result<Value, TypedOperationException> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.add(b, env))),
            (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
            (Value::Array(a), Value::Array(_)) => {
                let items = a
                    .iter()
                    .map(|lhs_elem| other.add(lhs_elem, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            (Value::Array(a), scalar) | (scalar, Value::Array(a)) => {
                let items = a
                    .iter()
                    .map(|x| x.add(scalar, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            (Value::Dictionary(a), scalar) | (scalar, Value::Dictionary(a)) => {
                let pairs = a
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.add(scalar, env)?)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::dictionary(pairs))
            }
            _ => Err(Self::type_error("adding", self, other)),
        }
    }

    pub fn sub(&self, other: &Value, env: &numeric::NumericEnvironment) -> Result<Value, TypedOperationException> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.sub(b, env))),
            (Value::Array(a), Value::Array(_)) => {
                let items = a
                    .iter()
                    .map(|lhs_elem| other.sub(lhs_elem, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            (Value::Array(a), scalar) => {
                let items = a
                    .iter()
                    .map(|x| x.sub(scalar, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            _ => Err(Self::type_error("subtracting", self, other)),
        }
    }

    pub fn mul(&self, other: &Value, env: &numeric::NumericEnvironment) -> Result<Value, TypedOperationException> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.mul(b, env))),
            (Value::Array(a), Value::Array(_)) => {
                let items = a
                    .iter()
                    .map(|lhs_elem| other.mul(lhs_elem, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            (Value::Array(a), scalar) | (scalar, Value::Array(a)) => {
                let items = a
                    .iter()
                    .map(|x| x.mul(scalar, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            _ => Err(Self::type_error("multiplying", self, other)),
        }
    }

    pub fn div(&self, other: &Value, env: &numeric::NumericEnvironment) -> Result<Value, TypedOperationException> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.div(b, env))),
            (Value::Array(a), Value::Array(_)) => {
                let items = a
                    .iter()
                    .map(|lhs_elem| other.div(lhs_elem, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            (Value::Array(a), scalar) => {
                let items = a
                    .iter()
                    .map(|x| x.div(scalar, env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            _ => Err(Self::type_error("dividing", self, other)),
        }
    }

    pub fn neg(&self) -> Result<Value, TypedOperationException> {
        match self {
            Value::Number(n) => Ok(Value::Number(n.neg())),
            Value::Array(a) => {
                let items = a.iter().map(|x| x.neg()).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(items))
            }
            _ => Err(TypedOperationException::new(format!(
                "Error negating {}",
                self.type_name()
            ))),
        }
    }

    /// Total order used by `Find`/dictionary key comparison/array sort
    /// helpers, matching spec §3's value order: Float < String < Array <
    /// Dictionary < Function < Nil < CellRef < CellRange. This is an
    /// internal sort key only — script-visible `=`/`<>`/`<`/`>`/`<=`/`>=`
    /// go through `values_equal`/`compare` below, which reject cross-type
    /// pairs instead of falling back to this order.
    fn rank(&self) -> u8 {
        match self {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Array(_) => 2,
            Value::Dictionary(_) => 3,
            Value::Function(_) => 4,
            Value::Nil => 5,
            Value::CellRef(_) => 6,
            Value::CellRange(_) => 7,
        }
    }

    /// Script-visible ordering comparison (`<`, `>`, `<=`, `>=`). Only
    /// Float/Float and String/String have a natural order; Nil compares
    /// against the canonical zero or empty string per spec §4.2's neutral
    /// rules. Any other pairing is a `TypedOperationException`, unlike the
    /// total `Ord` above which never fails.
    pub fn compare(&self, other: &Value) -> Result<std::cmp::Ordering, TypedOperationException> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Nil, Value::Number(b)) => Ok(Number::from_i64(0, 0).cmp(b)),
            (Value::Number(a), Value::Nil) => Ok(a.cmp(&Number::from_i64(0, 0))),
            (Value::Nil, Value::String(b)) => Ok("".cmp(b.as_str())),
            (Value::String(a), Value::Nil) => Ok(a.as_str().cmp("")),
            (Value::Nil, Value::Nil) => Ok(std::cmp::Ordering::Equal),
            _ => Err(Self::type_error("comparing", self, other)),
        }
    }

    /// Script-visible equality (`=`, `<>`). Same-type pairs across every
    /// variant compare structurally; Nil against Float/String follows the
    /// neutral-value rules. Everything else is a `TypedOperationException`
    /// rather than silently returning `false`.
    pub fn values_equal(&self, other: &Value) -> Result<bool, TypedOperationException> {
        match (self, other) {
            (Value::Nil, Value::Number(b)) | (Value::Number(b), Value::Nil) => Ok(b.is_zero()),
            (Value::Nil, Value::String(b)) | (Value::String(b), Value::Nil) => Ok(b.is_empty()),
            _ if self.type_name() == other.type_name() => Ok(self == other),
            _ => Err(Self::type_error("comparing", self, other)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "{{ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, " }}")
            }
            Value::Dictionary(pairs) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "\"{k}\":{v}")?;
                }
                write!(f, " }}")
            }
            Value::Function(func) => {
                let name = func.definition.name.as_deref().unwrap_or("<anonymous>");
                if func.captures.is_empty() {
                    write!(f, "Function : {name}")
                } else {
                    write!(f, "Function : {name} [ ")?;
                    for (i, (cap_name, _)) in func.captures.iter().enumerate() {
                        if i > 0 {
                            write!(f, "; ")?;
                        }
                        write!(f, "{cap_name}")?;
                    }
                    write!(f, " ]")
                }
            }
            Value::CellRef(addr) => write!(f, "{}", engine_display_address(addr)),
            Value::CellRange(range) => write!(
                f,
                "{}:{}",
                engine_display_address(&range.start),
                engine_display_address(&range.end)
            ),
        }
    }
}

/// Minimal A1-ish rendering for debugger/display purposes. The canonical
/// conversion (matching sheet grids) lives in `engine::coord`; this copy
/// exists only so `Value`'s `Display` doesn't depend on the `engine` crate.
fn engine_display_address(addr: &CellAddress) -> String {
    let mut col = addr.col + 1;
    let mut letters = String::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.insert(0, (b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    match &addr.sheet {
        Some(sheet) => format!("{sheet}!{letters}{}", addr.row + 1),
        None => format!("{letters}{}", addr.row + 1),
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Every pair of values compares, even across types — required so
    /// array `Sort`/dictionary keys never hit an incomparable pair at
    /// runtime. Cross-type order is by `rank()`; same-type order is the
    /// natural one, with Array/Dictionary compared lexicographically and
    /// Function ordered by definition identity (arbitrary but stable for
    /// the life of the process).
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::CellRef(a), Value::CellRef(b)) => a.cmp(b),
            (Value::CellRange(a), Value::CellRange(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Dictionary(a), Value::Dictionary(b)) => {
                let mut a_sorted = a.as_ref().clone();
                let mut b_sorted = b.as_ref().clone();
                a_sorted.sort();
                b_sorted.sort();
                a_sorted.cmp(&b_sorted)
            }
            (Value::Function(a), Value::Function(b)) => {
                Rc::as_ptr(&a.definition).cmp(&Rc::as_ptr(&b.definition))
            }
            (Value::Nil, Value::Nil) => std::cmp::Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Value::Nil => 0u8.hash(state),
            Value::Number(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(items) => {
                for item in items.iter() {
                    item.hash(state);
                }
            }
            Value::Dictionary(pairs) => {
                // Order-independent: XOR each pair's combined hash so
                // insertion order never affects the dictionary's hash.
                let mut combined: u64 = 0;
                for (k, v) in pairs.iter() {
                    let mut hasher = std::collections::hash_map::DefaultHasher::new();
                    k.hash(&mut hasher);
                    v.hash(&mut hasher);
                    combined ^= std::hash::Hasher::finish(&hasher);
                }
                combined.hash(state);
            }
            Value::Function(func) => {
                Rc::as_ptr(&func.definition).hash(state);
            }
            Value::CellRef(addr) => addr.hash(state),
            Value::CellRange(range) => range.hash(state),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => {
                // Order-independent: every pair in `a` must have a matching
                // pair in `b`, regardless of position (matches the
                // order-independent hash above).
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::CellRef(a), Value::CellRef(b)) => a == b,
            (Value::CellRange(a), Value::CellRange(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}
