//! Chained lexical scopes.
//!
//! An [`Env`] is a handle on one scope. Scopes are reference counted: closures
//! and deferred expansions created inside a scope keep it alive, and they see
//! bindings installed into it later. Each scope holds a persistent map, so
//! [`Env::bindings`] snapshots are cheap.
//!
//! Children see their parents; parents never see their children. Nothing is
//! ever removed.

use crate::ast::Symbol;
use crate::binding::Binding;
use im::HashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct Scope {
    bindings: RefCell<HashMap<Symbol, Binding>>,
    parent: Option<Env>,
    depth: usize,
}

#[derive(Clone)]
pub struct Env(Rc<Scope>);

impl Env {
    /// A scope with no parent.
    pub fn root() -> Self {
        Env(Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            depth: 0,
        }))
    }

    /// A fresh child scope. Nothing is copied.
    pub fn extend(&self) -> Self {
        Env(Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
            depth: self.0.depth + 1,
        }))
    }

    /// Innermost binding of `symbol`, walking outward.
    pub fn lookup(&self, symbol: &Symbol) -> Option<Binding> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(binding) = env.lookup_local(symbol) {
                return Some(binding);
            }
            scope = env.parent();
        }
        None
    }

    /// Binding of `symbol` in this scope only.
    pub fn lookup_local(&self, symbol: &Symbol) -> Option<Binding> {
        self.0.bindings.borrow().get(symbol).cloned()
    }

    /// Binding of `symbol` in some enclosing scope, ignoring this one.
    pub fn lookup_outer(&self, symbol: &Symbol) -> Option<Binding> {
        self.parent().and_then(|parent| parent.lookup(symbol))
    }

    pub fn is_bound(&self, symbol: &Symbol) -> bool {
        self.lookup(symbol).is_some()
    }

    /// Installs `binding` under its binder in this scope, returning the entry
    /// it replaced in this same scope.
    pub fn install(&self, binding: Binding) -> Option<Binding> {
        let binder = binding.binder().clone();
        self.0.bindings.borrow_mut().insert(binder, binding)
    }

    pub fn parent(&self) -> Option<&Env> {
        self.0.parent.as_ref()
    }

    /// Number of scopes between this one and the root.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    /// Snapshot of this scope's own bindings.
    pub fn bindings(&self) -> HashMap<Symbol, Binding> {
        self.0.bindings.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.bindings.borrow().is_empty()
    }

    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("depth", &self.0.depth)
            .field("bindings", &self.len())
            .finish()
    }
}
