//! Source nodes: what expansion produces for the code generator.

use crate::ast::{Form, Sexpr, Span, Symbol};
use crate::binding::{CIterator, CMatcher, Env, Field, FormalList, FunMatcher, Hook, Primitive};
use crate::macros::{Expander, ModuleContext};
use crate::patterns::{Pattern, PatternVariable};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// The result of expanding one form. A null expansion is `None` at the call
/// sites.
#[derive(Debug, Clone)]
pub enum Expansion {
    /// An atom (or quoted form) passed through unchanged.
    Literal(Form),
    Node(Rc<Source>),
    /// Several results; the toplevel driver splices them.
    Many(Vec<Expansion>),
}

impl Expansion {
    pub fn node(source: Source) -> Self {
        Expansion::Node(Rc::new(source))
    }

    pub fn as_literal(&self) -> Option<&Form> {
        match self {
            Expansion::Literal(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&Source> {
        match self {
            Expansion::Node(source) => Some(source),
            _ => None,
        }
    }

    pub fn as_deferred(&self) -> Option<&Deferred> {
        match self.as_source() {
            Some(Source::LazyMacroExpansion(deferred)) => Some(deferred),
            _ => None,
        }
    }

    pub fn pretty(&self) -> String {
        match self {
            Expansion::Literal(form) => form.pretty(),
            Expansion::Node(source) => source.pretty(),
            Expansion::Many(items) => format!("(many{})", pretty_seq(items)),
        }
    }
}

/// Literals compare structurally, nodes by identity.
impl PartialEq for Expansion {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expansion::Literal(a), Expansion::Literal(b)) => a == b,
            (Expansion::Node(a), Expansion::Node(b)) => Rc::ptr_eq(a, b),
            (Expansion::Many(a), Expansion::Many(b)) => a == b,
            _ => false,
        }
    }
}

/// One slot per operand, in operand order. A slot is `None` when its operand
/// expanded to nothing, so slots keep lining up with the callee's formals.
pub type ExpansionTuple = Vec<Option<Expansion>>;

/// One clause of a `match` expression.
#[derive(Debug, Clone)]
pub struct MatchClause {
    pub span: Span,
    pub pattern: Pattern,
    /// The pattern variables bound in the clause body, in first-use order.
    pub variables: Vec<Rc<PatternVariable>>,
    pub body: Vec<Expansion>,
}

impl MatchClause {
    pub fn weight(&self) -> i64 {
        self.pattern.weight()
    }
}

/// Every shape the expander can emit.
#[derive(Debug, Clone)]
pub enum Source {
    Apply {
        span: Span,
        fun: Expansion,
        args: ExpansionTuple,
    },
    Msend {
        span: Span,
        selector: Symbol,
        receiver: Expansion,
        args: ExpansionTuple,
    },
    GetField {
        span: Span,
        field: Arc<Field>,
        object: Expansion,
    },
    CIteration {
        span: Span,
        citerator: Arc<CIterator>,
        start_args: ExpansionTuple,
        loop_formals: FormalList,
        body: Vec<Expansion>,
    },
    Primitive {
        span: Span,
        operator: Symbol,
        primitive: Arc<Primitive>,
        args: ExpansionTuple,
    },
    HookCall {
        span: Span,
        operator: Symbol,
        hook: Arc<Hook>,
        args: ExpansionTuple,
    },
    CMatchExpr {
        span: Span,
        matcher: Arc<CMatcher>,
        args: ExpansionTuple,
    },
    FunMatchExpr {
        span: Span,
        matcher: Arc<FunMatcher>,
        args: ExpansionTuple,
    },
    Let {
        span: Span,
        bindings: Vec<(Symbol, Expansion)>,
        body: Vec<Expansion>,
    },
    Match {
        span: Span,
        matched: Expansion,
        clauses: Vec<MatchClause>,
        max_weight: i64,
        min_weight: i64,
    },
    LazyMacroExpansion(Deferred),
}

impl Source {
    pub fn span(&self) -> Span {
        match self {
            Source::Apply { span, .. }
            | Source::Msend { span, .. }
            | Source::GetField { span, .. }
            | Source::CIteration { span, .. }
            | Source::Primitive { span, .. }
            | Source::HookCall { span, .. }
            | Source::CMatchExpr { span, .. }
            | Source::FunMatchExpr { span, .. }
            | Source::Let { span, .. }
            | Source::Match { span, .. } => *span,
            Source::LazyMacroExpansion(deferred) => deferred.form.span,
        }
    }

    /// S-expression rendering for traces and the CLI.
    pub fn pretty(&self) -> String {
        match self {
            Source::Apply { fun, args, .. } => {
                format!("(apply {}{})", fun.pretty(), pretty_tuple(args))
            }
            Source::Msend {
                selector,
                receiver,
                args,
                ..
            } => format!("(msend {} {}{})", selector, receiver.pretty(), pretty_tuple(args)),
            Source::GetField { field, object, .. } => {
                format!("(get_field {} {})", field.name, object.pretty())
            }
            Source::CIteration {
                citerator,
                start_args,
                loop_formals,
                body,
                ..
            } => format!(
                "(citeration {} ({}) {}{})",
                citerator.name,
                pretty_tuple(start_args).trim_start(),
                loop_formals,
                pretty_seq(body)
            ),
            Source::Primitive { operator, args, .. } => {
                format!("(primitive {}{})", operator, pretty_tuple(args))
            }
            Source::HookCall { operator, args, .. } => {
                format!("(hookcall {}{})", operator, pretty_tuple(args))
            }
            Source::CMatchExpr { matcher, args, .. } => {
                format!("(cmatchexpr {}{})", matcher.name, pretty_tuple(args))
            }
            Source::FunMatchExpr { matcher, args, .. } => {
                format!("(funmatchexpr {}{})", matcher.name, pretty_tuple(args))
            }
            Source::Let { bindings, body, .. } => {
                let bound = bindings
                    .iter()
                    .map(|(name, expr)| format!("({} {})", name, expr.pretty()))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("(let ({}){})", bound, pretty_seq(body))
            }
            Source::Match {
                matched, clauses, ..
            } => {
                let clauses = clauses
                    .iter()
                    .map(|clause| {
                        format!(
                            " ({} #w{}{})",
                            clause.pattern.pretty(),
                            clause.weight(),
                            pretty_seq(&clause.body)
                        )
                    })
                    .collect::<String>();
                format!("(match {}{})", matched.pretty(), clauses)
            }
            Source::LazyMacroExpansion(deferred) => format!(
                "(lazy_macro_expansion {} {})",
                deferred.operator,
                Form::List(deferred.form.clone()).pretty()
            ),
        }
    }
}

fn pretty_seq(items: &[Expansion]) -> String {
    items.iter().map(|e| format!(" {}", e.pretty())).collect()
}

/// Renders a tuple; empty slots print as `()`.
pub(crate) fn pretty_tuple(slots: &[Option<Expansion>]) -> String {
    slots
        .iter()
        .map(|slot| match slot {
            Some(e) => format!(" {}", e.pretty()),
            None => " ()".to_string(),
        })
        .collect()
}

// ============================================================================
// DEFERRED EXPANSION
// ============================================================================

/// A form whose operator was unbound when it was expanded.
///
/// It keeps everything needed to retry: the form, the scope it appeared in,
/// the expander and the module context that was active.
#[derive(Clone)]
pub struct Deferred {
    pub form: Arc<Sexpr>,
    pub env: Env,
    pub expander: Expander,
    pub module: ModuleContext,
    pub operator: Symbol,
}

impl Deferred {
    pub fn is_resolvable(&self) -> bool {
        self.env.is_bound(&self.operator)
    }

    /// Retries the expansion. Reports an error and yields `None` while the
    /// operator is still unbound.
    pub fn force(&self) -> Option<Expansion> {
        if !self.is_resolvable() {
            self.module.error(
                Some(self.form.span),
                format!("operator {} is still unbound", self.operator),
                Some(Form::List(self.form.clone()).pretty()),
            );
            self.module.inform(
                Some(self.form.span),
                "define it as a macro, selector, primitive or function before the deferred expansion is resolved",
                None,
            );
            return None;
        }
        self.expander
            .expand(&Form::List(self.form.clone()), &self.env, &self.module)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("operator", &self.operator)
            .field("form", &Form::List(self.form.clone()).pretty())
            .field("env", &self.env)
            .finish()
    }
}
