//! # Bindings and environments
//!
//! A [`Binding`] gives a symbol its meaning for the expander: a macro, a
//! selector, a primitive, a matcher, a lexical variable... Bindings live in
//! [`Env`] scopes, always keyed by their own binder symbol.
//!
//! ## Module Structure
//!
//! - **`descriptor`**: read-only descriptors of primitives, citerators, hooks, matchers, fields
//! - **`env`**: chained scopes and lookup
//! - **`formal`**: formal bindings and formal lists
//! - **`value`**: values held by value bindings

pub mod descriptor;
pub mod env;
pub mod formal;
pub mod value;

pub use descriptor::{
    CIterator, CMatcher, Closure, Field, FunMatcher, Hook, Matcher, MatcherRef, Primitive,
};
pub use env::Env;
pub use formal::{FormalBinding, FormalKind, FormalList};
pub use value::Value;

use crate::ast::{Sexpr, Symbol};
use crate::macros::MacroExpander;
use crate::patterns::PatternExpander;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// BINDING KINDS
// ============================================================================

#[derive(Clone)]
pub struct MacroBinding {
    pub binder: Symbol,
    pub expander: MacroExpander,
}

#[derive(Clone)]
pub struct PatMacroBinding {
    pub binder: Symbol,
    pub macro_expander: MacroExpander,
    pub pattern_expander: PatternExpander,
}

#[derive(Debug, Clone)]
pub struct FunMatcherBinding {
    pub binder: Symbol,
    pub matcher: Arc<FunMatcher>,
    pub defining_form: Option<Arc<Sexpr>>,
}

/// Every way a symbol can be bound.
#[derive(Clone)]
pub enum Binding {
    Macro(MacroBinding),
    PatMacro(PatMacroBinding),
    Selector { binder: Symbol },
    Primitive { binder: Symbol, primitive: Arc<Primitive> },
    CIterator { binder: Symbol, citerator: Arc<CIterator> },
    Hook { binder: Symbol, hook: Arc<Hook> },
    CMatcher { binder: Symbol, matcher: Arc<CMatcher> },
    FunMatcher(FunMatcherBinding),
    Field { binder: Symbol, field: Arc<Field> },
    Formal(FormalBinding),
    Let { binder: Symbol },
    Value { binder: Symbol, value: Value },
}

/// Discriminant of a [`Binding`], used in traces and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Macro,
    PatMacro,
    Selector,
    Primitive,
    CIterator,
    Hook,
    CMatcher,
    FunMatcher,
    Field,
    Formal,
    Let,
    Value,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Macro => "macro",
            BindingKind::PatMacro => "pattern macro",
            BindingKind::Selector => "selector",
            BindingKind::Primitive => "primitive",
            BindingKind::CIterator => "citerator",
            BindingKind::Hook => "hook",
            BindingKind::CMatcher => "cmatcher",
            BindingKind::FunMatcher => "funmatcher",
            BindingKind::Field => "field",
            BindingKind::Formal => "formal",
            BindingKind::Let => "let",
            BindingKind::Value => "value",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Binding {
    /// The symbol this binding must be installed under.
    pub fn binder(&self) -> &Symbol {
        match self {
            Binding::Macro(b) => &b.binder,
            Binding::PatMacro(b) => &b.binder,
            Binding::Selector { binder }
            | Binding::Primitive { binder, .. }
            | Binding::CIterator { binder, .. }
            | Binding::Hook { binder, .. }
            | Binding::CMatcher { binder, .. }
            | Binding::Field { binder, .. }
            | Binding::Let { binder }
            | Binding::Value { binder, .. } => binder,
            Binding::FunMatcher(b) => &b.binder,
            Binding::Formal(f) => &f.binder,
        }
    }

    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::Macro(_) => BindingKind::Macro,
            Binding::PatMacro(_) => BindingKind::PatMacro,
            Binding::Selector { .. } => BindingKind::Selector,
            Binding::Primitive { .. } => BindingKind::Primitive,
            Binding::CIterator { .. } => BindingKind::CIterator,
            Binding::Hook { .. } => BindingKind::Hook,
            Binding::CMatcher { .. } => BindingKind::CMatcher,
            Binding::FunMatcher(_) => BindingKind::FunMatcher,
            Binding::Field { .. } => BindingKind::Field,
            Binding::Formal(_) => BindingKind::Formal,
            Binding::Let { .. } => BindingKind::Let,
            Binding::Value { .. } => BindingKind::Value,
        }
    }

    // Convenience constructors for descriptor-backed bindings; each one keys
    // the binding by the descriptor's own name.

    pub fn selector(name: &str) -> Self {
        Binding::Selector {
            binder: Symbol::intern(name),
        }
    }

    pub fn primitive(primitive: Primitive) -> Self {
        Binding::Primitive {
            binder: primitive.name.clone(),
            primitive: Arc::new(primitive),
        }
    }

    pub fn citerator(citerator: CIterator) -> Self {
        Binding::CIterator {
            binder: citerator.name.clone(),
            citerator: Arc::new(citerator),
        }
    }

    pub fn hook(hook: Hook) -> Self {
        Binding::Hook {
            binder: hook.name.clone(),
            hook: Arc::new(hook),
        }
    }

    pub fn cmatcher(matcher: CMatcher) -> Self {
        Binding::CMatcher {
            binder: matcher.name.clone(),
            matcher: Arc::new(matcher),
        }
    }

    pub fn funmatcher(matcher: FunMatcher, defining_form: Option<Arc<Sexpr>>) -> Self {
        Binding::FunMatcher(FunMatcherBinding {
            binder: matcher.name.clone(),
            matcher: Arc::new(matcher),
            defining_form,
        })
    }

    pub fn field(field: Field) -> Self {
        Binding::Field {
            binder: field.name.clone(),
            field: Arc::new(field),
        }
    }

    pub fn value(name: &str, value: Value) -> Self {
        Binding::Value {
            binder: Symbol::intern(name),
            value,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Value { binder, value } => {
                write!(f, "Binding::Value({} = {})", binder, value)
            }
            Binding::Formal(formal) => write!(
                f,
                "Binding::Formal({} #{} {})",
                formal.binder, formal.rank, formal.ctype
            ),
            other => write!(f, "Binding::{:?}({})", other.kind(), other.binder()),
        }
    }
}
