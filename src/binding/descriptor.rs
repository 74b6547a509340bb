//! Descriptors for the callable things a binding can stand for.
//!
//! Descriptors are produced by definition forms elsewhere in the compiler and
//! are read-only here: the dispatcher only needs their names, arities and
//! declared types.

use crate::ast::ctype::{CType, CTYPE_VALUE};
use crate::ast::Symbol;
use crate::binding::formal::FormalList;
use std::sync::Arc;

/// A primitive operation expanded inline by the code generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub name: Symbol,
    pub formals: FormalList,
    pub ctype: &'static CType,
}

impl Primitive {
    pub fn new(name: &str, formals: FormalList, ctype: &'static CType) -> Self {
        Primitive {
            name: Symbol::intern(name),
            formals,
            ctype,
        }
    }
}

/// A custom iteration construct.
#[derive(Debug, Clone, PartialEq)]
pub struct CIterator {
    pub name: Symbol,
    /// Formals of the start-argument section.
    pub start_formals: FormalList,
    /// Loop variables the body sees.
    pub loop_formals: FormalList,
}

impl CIterator {
    pub fn new(name: &str, start_formals: FormalList, loop_formals: FormalList) -> Self {
        CIterator {
            name: Symbol::intern(name),
            start_formals,
            loop_formals,
        }
    }
}

/// An extension point implemented by host-side code.
#[derive(Debug, Clone, PartialEq)]
pub struct Hook {
    pub name: Symbol,
    pub in_formals: FormalList,
    pub out_formals: FormalList,
    pub ctype: &'static CType,
}

impl Hook {
    pub fn new(name: &str, in_formals: FormalList, out_formals: FormalList) -> Self {
        Hook {
            name: Symbol::intern(name),
            in_formals,
            out_formals,
            ctype: &CTYPE_VALUE,
        }
    }
}

/// Arity protocol shared by both matcher flavors.
pub trait Matcher {
    fn name(&self) -> &Symbol;
    fn in_formals(&self) -> &FormalList;
    fn out_formals(&self) -> &FormalList;

    fn in_arity(&self) -> usize {
        self.in_formals().len()
    }

    fn out_arity(&self) -> usize {
        self.out_formals().len()
    }
}

/// A matcher whose test and fill code is emitted inline.
#[derive(Debug, Clone, PartialEq)]
pub struct CMatcher {
    pub name: Symbol,
    pub in_formals: FormalList,
    pub out_formals: FormalList,
}

impl CMatcher {
    pub fn new(name: &str, in_formals: FormalList, out_formals: FormalList) -> Self {
        CMatcher {
            name: Symbol::intern(name),
            in_formals,
            out_formals,
        }
    }
}

impl Matcher for CMatcher {
    fn name(&self) -> &Symbol {
        &self.name
    }
    fn in_formals(&self) -> &FormalList {
        &self.in_formals
    }
    fn out_formals(&self) -> &FormalList {
        &self.out_formals
    }
}

/// A matcher implemented by a match function (and optionally an apply
/// function used when the matcher appears in expression position).
#[derive(Debug, Clone, PartialEq)]
pub struct FunMatcher {
    pub name: Symbol,
    pub in_formals: FormalList,
    pub out_formals: FormalList,
    pub match_fun: Option<Symbol>,
    pub apply_fun: Option<Symbol>,
}

impl FunMatcher {
    pub fn new(name: &str, in_formals: FormalList, out_formals: FormalList) -> Self {
        FunMatcher {
            name: Symbol::intern(name),
            in_formals,
            out_formals,
            match_fun: None,
            apply_fun: None,
        }
    }
}

impl Matcher for FunMatcher {
    fn name(&self) -> &Symbol {
        &self.name
    }
    fn in_formals(&self) -> &FormalList {
        &self.in_formals
    }
    fn out_formals(&self) -> &FormalList {
        &self.out_formals
    }
}

/// A field of an object class.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: Symbol,
    pub class: Symbol,
    pub offset: usize,
}

impl Field {
    pub fn new(name: &str, class: &str, offset: usize) -> Self {
        Field {
            name: Symbol::intern(name),
            class: Symbol::intern(class),
            offset,
        }
    }
}

/// A closure value: a routine plus its captured values.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub name: Option<Symbol>,
    pub routine: Symbol,
    pub captured: Vec<crate::binding::Value>,
}

/// Either matcher flavor, as resolved from a binding or a held value.
#[derive(Debug, Clone)]
pub enum MatcherRef {
    C(Arc<CMatcher>),
    Fun(Arc<FunMatcher>),
}

impl MatcherRef {
    pub fn as_matcher(&self) -> &dyn Matcher {
        match self {
            MatcherRef::C(m) => m.as_ref(),
            MatcherRef::Fun(m) => m.as_ref(),
        }
    }
}
