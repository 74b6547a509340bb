//! Values held by value bindings.

use crate::ast::{Form, Symbol};
use crate::binding::descriptor::{CIterator, CMatcher, Closure, Field, FunMatcher, Hook, Primitive};
use std::fmt;
use std::sync::Arc;

/// A value known at expansion time.
///
/// The first eight variants are callable in operator position; the rest are
/// plain data and make an application ill-formed.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Closure(Arc<Closure>),
    Primitive(Arc<Primitive>),
    Selector(Symbol),
    CIterator(Arc<CIterator>),
    Hook(Arc<Hook>),
    CMatcher(Arc<CMatcher>),
    FunMatcher(Arc<FunMatcher>),
    Field(Arc<Field>),
    Integer(i64),
    String(String),
    Symbol(Symbol),
    Form(Form),
}

impl Value {
    /// The discriminant name, as reported in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Closure(_) => "closure",
            Value::Primitive(_) => "primitive",
            Value::Selector(_) => "selector",
            Value::CIterator(_) => "citerator",
            Value::Hook(_) => "hook",
            Value::CMatcher(_) => "cmatcher",
            Value::FunMatcher(_) => "funmatcher",
            Value::Field(_) => "field",
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Form(_) => "form",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Closure(c) => match &c.name {
                Some(name) => write!(f, "#<closure {}>", name),
                None => write!(f, "#<closure {}>", c.routine),
            },
            Value::Primitive(p) => write!(f, "#<primitive {}>", p.name),
            Value::Selector(s) => write!(f, "#<selector {}>", s),
            Value::CIterator(c) => write!(f, "#<citerator {}>", c.name),
            Value::Hook(h) => write!(f, "#<hook {}>", h.name),
            Value::CMatcher(m) => write!(f, "#<cmatcher {}>", m.name),
            Value::FunMatcher(m) => write!(f, "#<funmatcher {}>", m.name),
            Value::Field(fd) => write!(f, "#<field {}>", fd.name),
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Form(form) => f.write_str(&form.pretty()),
        }
    }
}
