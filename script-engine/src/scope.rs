//! FILENAME: script-engine/src/scope.rs
//! PURPOSE: Lexical variable storage (spec §4.6 scope lifecycle).
//! CONTEXT: Each function call gets a fresh root `Scope`; nested blocks
//! (`if`/`while`/`for` bodies) push child scopes that fall out of scope
//! when the block ends. A declared-but-unassigned slot stores `None` so
//! reading it produces the original's "Error: Read of value before set."
//! instead of silently returning Nil.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use parser::Value;

pub struct Scope {
    vars: RefCell<HashMap<String, Option<Value>>>,
    parent: Option<Rc<Scope>>,
}

pub enum LookupResult {
    Uninitialized,
    Value(Value),
}

impl Scope {
    pub fn root() -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub fn child(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    pub fn declare(&self, name: impl Into<String>, value: Option<Value>) {
        self.vars.borrow_mut().insert(name.into(), value);
    }

    /// Walks this scope and its ancestors (stopping at the function's root
    /// scope — callers pass that root directly when captures/globals need
    /// to be consulted next, since closures never implicitly see an outer
    /// function's locals).
    pub fn get(&self, name: &str) -> Option<LookupResult> {
        if let Some(slot) = self.vars.borrow().get(name) {
            return Some(match slot {
                Some(v) => LookupResult::Value(v.clone()),
                None => LookupResult::Uninitialized,
            });
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Assigns to the nearest enclosing declaration of `name`, returning
    /// `false` if no such declaration exists in this scope chain.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.vars.borrow().contains_key(name) {
            self.vars.borrow_mut().insert(name.to_string(), Some(value));
            return true;
        }
        match &self.parent {
            Some(p) => p.assign(name, value),
            None => false,
        }
    }

    /// Names declared directly in this scope, in no particular order —
    /// used by the debugger's `show` command.
    pub fn own_names(&self) -> Vec<String> {
        self.vars.borrow().keys().cloned().collect()
    }

    /// Names declared anywhere in this scope or an ancestor, up to (and
    /// including) the function's root scope — the debugger's "current
    /// stack frame" listing walks this instead of a single `own_names()`
    /// since nested `if`/`while`/`for` blocks each get their own child
    /// scope rather than sharing the frame's root one.
    pub fn chain_names(&self) -> Vec<String> {
        let mut names = self.own_names();
        if let Some(parent) = &self.parent {
            names.extend(parent.chain_names());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numeric::Number;

    #[test]
    fn child_scope_sees_parent_declarations() {
        let root = Scope::root();
        root.declare("x", Some(Value::Number(Number::from_i64(1, 0))));
        let child = Scope::child(&root);
        assert!(matches!(child.get("x"), Some(LookupResult::Value(_))));
    }

    #[test]
    fn uninitialized_slot_reports_as_such() {
        let root = Scope::root();
        root.declare("x", None);
        assert!(matches!(root.get("x"), Some(LookupResult::Uninitialized)));
    }

    #[test]
    fn assign_reaches_into_parent_scope() {
        let root = Scope::root();
        root.declare("x", Some(Value::Number(Number::from_i64(1, 0))));
        let child = Scope::child(&root);
        assert!(child.assign("x", Value::Number(Number::from_i64(2, 0))));
        match root.get("x") {
            Some(LookupResult::Value(Value::Number(n))) => assert_eq!(n.to_string(), "2"),
            _ => panic!("expected updated value visible from root"),
        }
    }

    #[test]
    fn assign_to_undeclared_name_fails() {
        let root = Scope::root();
        assert!(!root.assign("missing", Value::Nil));
    }
}
