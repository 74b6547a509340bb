//! Formal argument bindings and the tuples the formal binder produces.

use crate::ast::ctype::{CType, CTYPE_VALUE};
use crate::ast::{Form, Span, Symbol};
use std::collections::HashMap;
use std::fmt;

/// One formal: its name, position and declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct FormalBinding {
    pub binder: Symbol,
    pub rank: usize,
    pub ctype: &'static CType,
}

impl FormalBinding {
    pub fn new(binder: Symbol, rank: usize, ctype: &'static CType) -> Self {
        FormalBinding {
            binder,
            rank,
            ctype,
        }
    }
}

/// Whether a formal list takes exactly its formals or accepts more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormalKind {
    #[default]
    Fixed,
    Variadic,
}

/// The ordered result of binding a formal argument list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormalList {
    pub kind: FormalKind,
    pub bindings: Vec<FormalBinding>,
    by_name: HashMap<Symbol, usize>,
    rest_named: bool,
}

impl FormalList {
    pub fn new(kind: FormalKind) -> Self {
        FormalList {
            kind,
            ..Default::default()
        }
    }

    /// A fixed list of `value`-typed formals, for building descriptors by hand.
    ///
    /// ```rust
    /// use mexpand::binding::FormalList;
    /// let formals = FormalList::fixed(&["a", "b"]);
    /// assert_eq!(formals.len(), 2);
    /// assert_eq!(formals.get_by_name("b").unwrap().rank, 1);
    /// ```
    pub fn fixed(names: &[&str]) -> Self {
        let mut list = FormalList::new(FormalKind::Fixed);
        for name in names {
            list.push(Symbol::intern(name), &CTYPE_VALUE);
        }
        list
    }

    /// Appends a formal at the next rank. Returns `None` if the name is taken.
    pub fn push(&mut self, binder: Symbol, ctype: &'static CType) -> Option<&FormalBinding> {
        if self.by_name.contains_key(&binder) {
            return None;
        }
        let rank = self.bindings.len();
        self.by_name.insert(binder.clone(), rank);
        self.bindings.push(FormalBinding::new(binder, rank, ctype));
        self.bindings.last()
    }

    /// Appends the binder that collects surplus arguments and marks the list
    /// variadic.
    pub fn push_rest(&mut self, binder: Symbol, ctype: &'static CType) -> Option<&FormalBinding> {
        self.kind = FormalKind::Variadic;
        if self.by_name.contains_key(&binder) {
            return None;
        }
        self.rest_named = true;
        self.push(binder, ctype)
    }

    /// True when the final formal is the rest binder.
    pub fn has_rest_binder(&self) -> bool {
        self.rest_named
    }

    /// Number of formals that must receive an argument.
    pub fn required(&self) -> usize {
        self.len() - usize::from(self.rest_named)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn is_variadic(&self) -> bool {
        self.kind == FormalKind::Variadic
    }

    pub fn get(&self, binder: &Symbol) -> Option<&FormalBinding> {
        self.by_name.get(binder).map(|&rank| &self.bindings[rank])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&FormalBinding> {
        self.get(&Symbol::intern(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormalBinding> {
        self.bindings.iter()
    }

    /// Whether `count` actual arguments satisfy this list.
    pub fn accepts(&self, count: usize) -> bool {
        match self.kind {
            FormalKind::Fixed => count == self.len(),
            FormalKind::Variadic => count >= self.required(),
        }
    }

    /// Human-readable expected argument count, for diagnostics.
    pub fn arity_description(&self) -> String {
        match self.kind {
            FormalKind::Fixed => format!("exactly {}", self.len()),
            FormalKind::Variadic => format!("at least {}", self.required()),
        }
    }

    /// Rebuilds the list as a form, e.g. `(:long a b :rest r)`.
    pub fn to_form(&self, span: Span) -> Form {
        let mut contents = Vec::new();
        let last = self.bindings.len().saturating_sub(1);
        for binding in &self.bindings {
            if self.rest_named && binding.rank == last {
                contents.push(Form::sym(":rest"));
            }
            if !std::ptr::eq(binding.ctype, &CTYPE_VALUE) {
                contents.push(Form::sym(binding.ctype.keyword));
            }
            contents.push(Form::Symbol(binding.binder.clone()));
        }
        if self.is_variadic() && !self.rest_named {
            contents.push(Form::sym(":rest"));
        }
        Form::list(contents, span)
    }
}

impl fmt::Display for FormalList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_form(Span::default()).pretty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ctype::CTYPE_LONG;

    #[test]
    fn push_rejects_duplicates() {
        let mut list = FormalList::new(FormalKind::Fixed);
        assert!(list.push(Symbol::intern("a"), &CTYPE_VALUE).is_some());
        assert!(list.push(Symbol::intern("a"), &CTYPE_LONG).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn variadic_accepts_missing_rest() {
        let mut list = FormalList::fixed(&["a"]);
        list.push_rest(Symbol::intern("r"), &CTYPE_VALUE);
        assert!(list.accepts(1));
        assert!(list.accepts(4));
        assert!(!list.accepts(0));
        assert_eq!(list.arity_description(), "at least 1");
    }

    #[test]
    fn display_round_trips_markers() {
        let mut list = FormalList::new(FormalKind::Variadic);
        list.push(Symbol::intern("n"), &CTYPE_LONG);
        list.push_rest(Symbol::intern("more"), &CTYPE_VALUE);
        assert_eq!(list.to_string(), "(:long n :rest more)");
    }

    #[test]
    fn anonymous_rest_marker_goes_last() {
        let mut list = FormalList::fixed(&["a"]);
        list.kind = FormalKind::Variadic;
        assert_eq!(list.required(), 1);
        assert_eq!(list.to_string(), "(a :rest)");
    }
}
