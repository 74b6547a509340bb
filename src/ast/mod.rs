//! Symbolic forms: the located, already-parsed input of the expander.
//!
//! The reader (outside this crate) produces a tree of [`Form`]s. Compound
//! nodes are [`Sexpr`]s carrying a [`Span`]; atoms (symbols, integers,
//! strings) are self-representing and carry no location of their own.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod ctype;
pub mod json;
pub mod symbol;

pub use ctype::CType;
pub use symbol::{Symbol, SymbolData};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a span in the source code.
///
/// Every compound form carries one; diagnostics and emitted nodes reuse it.
///
/// # Examples
///
/// ```rust
/// use mexpand::ast::Span;
/// let span = Span { start: 0, end: 5 };
/// assert_eq!(span.start, 0);
/// assert_eq!(span.end, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// A compound symbolic form: ordered contents plus the location it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sexpr {
    pub contents: Vec<Form>,
    pub span: Span,
}

/// One node of the input tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Form {
    List(Arc<Sexpr>),
    Symbol(Symbol),
    Integer(i64),
    String(String),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Sexpr {
    pub fn new(contents: Vec<Form>, span: Span) -> Self {
        Sexpr { contents, span }
    }

    /// The head of the contents, if any.
    pub fn operator(&self) -> Option<&Form> {
        self.contents.first()
    }

    /// Everything after the head.
    pub fn rest(&self) -> &[Form] {
        self.contents.get(1..).unwrap_or(&[])
    }
}

impl Form {
    /// Builds a compound form.
    ///
    /// ```rust
    /// use mexpand::ast::{Form, Span};
    /// let form = Form::list(vec![Form::sym("f"), Form::Integer(1)], Span::new(0, 5));
    /// assert_eq!(form.pretty(), "(f 1)");
    /// ```
    pub fn list(contents: Vec<Form>, span: Span) -> Self {
        Form::List(Arc::new(Sexpr::new(contents, span)))
    }

    pub fn sym(name: &str) -> Self {
        Form::Symbol(Symbol::intern(name))
    }

    pub fn as_sexpr(&self) -> Option<&Arc<Sexpr>> {
        match self {
            Form::List(sexpr) => Some(sexpr),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Form::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Form::List(_))
    }

    /// The location of a compound form; atoms have none.
    pub fn span(&self) -> Option<Span> {
        self.as_sexpr().map(|s| s.span)
    }

    /// Short discriminant name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Form::List(_) => "list",
            Form::Symbol(sym) if sym.is_keyword() => "keyword",
            Form::Symbol(_) => "symbol",
            Form::Integer(_) => "integer",
            Form::String(_) => "string",
        }
    }

    /// Pretty-prints the form as s-expression text.
    pub fn pretty(&self) -> String {
        match self {
            Form::List(sexpr) => Self::pretty_list(&sexpr.contents),
            Form::Symbol(sym) => sym.name().to_string(),
            Form::Integer(n) => n.to_string(),
            Form::String(s) => format!("{:?}", s),
        }
    }

    fn pretty_list(contents: &[Form]) -> String {
        let inner = contents
            .iter()
            .map(Form::pretty)
            .collect::<Vec<_>>()
            .join(" ");
        format!("({})", inner)
    }
}

impl From<Symbol> for Form {
    fn from(sym: Symbol) -> Self {
        Form::Symbol(sym)
    }
}

impl From<i64> for Form {
    fn from(n: i64) -> Self {
        Form::Integer(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_of_empty_form_is_empty() {
        let sexpr = Sexpr::new(vec![], Span::default());
        assert!(sexpr.operator().is_none());
        assert!(sexpr.rest().is_empty());
    }

    #[test]
    fn pretty_nested() {
        let inner = Form::list(vec![Form::sym("?"), Form::sym("x")], Span::new(6, 11));
        let outer = Form::list(
            vec![Form::sym("match"), inner, Form::String("s".into())],
            Span::new(0, 16),
        );
        assert_eq!(outer.pretty(), "(match (? x) \"s\")");
    }

    #[test]
    fn atoms_have_no_span() {
        assert_eq!(Form::Integer(3).span(), None);
        assert_eq!(Form::sym(":long").kind_name(), "keyword");
    }
}
