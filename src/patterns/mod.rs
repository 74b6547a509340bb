//! # Pattern compilation
//!
//! Patterns appear in the clauses of `match` expressions. Compiling one turns
//! its form into a [`Pattern`] tree whose every node carries a static weight:
//! leaves weigh [`LEAF_PATTERN_WEIGHT`], composite matcher nodes weigh one more
//! than the sum of their sub-patterns. Weights give downstream passes a cheap
//! specificity estimate for ordering and costing clauses.
//!
//! Within one clause, every `(? x)` for the same `x` compiles to the *same*
//! [`PatternVariable`] node; a fresh [`PatternContext`] per clause keeps
//! variables from leaking between clauses.

pub mod expander;

pub use expander::{
    compile_match_args, patmacexpand_for_matcher, patternexpand_1, patternexpand_expr,
};

use crate::ast::{Sexpr, Span, Symbol};
use crate::binding::{CMatcher, Env, FunMatcher, Matcher};
use crate::macros::source::pretty_tuple;
use crate::macros::{Expander, Expansion, ExpansionTuple, ModuleContext};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Weight of every leaf pattern.
pub const LEAF_PATTERN_WEIGHT: i64 = 1;

// ============================================================================
// PATTERN NODES
// ============================================================================

/// Matches when the subject equals an expression's value.
#[derive(Debug)]
pub struct PatternConstant {
    pub span: Span,
    pub expr: Expansion,
}

/// Binds the subject to a name; a second use in the same clause tests equality.
#[derive(Debug)]
pub struct PatternVariable {
    pub span: Span,
    pub symbol: Symbol,
    occurrences: Cell<u32>,
}

/// `(? _)`: matches anything and binds nothing.
#[derive(Debug)]
pub struct PatternJoker {
    pub span: Span,
    occurrences: Cell<u32>,
}

/// A matcher applied to in-arguments, with sub-patterns for its outputs.
#[derive(Debug)]
pub struct MatchPattern<M> {
    pub span: Span,
    pub weight: i64,
    pub matcher: Arc<M>,
    /// One slot per in-operand.
    pub in_args: ExpansionTuple,
    pub out_patterns: Vec<Pattern>,
}

#[derive(Debug, Clone)]
pub enum Pattern {
    Constant(Rc<PatternConstant>),
    Variable(Rc<PatternVariable>),
    Joker(Rc<PatternJoker>),
    CMatch(Rc<MatchPattern<CMatcher>>),
    FunMatch(Rc<MatchPattern<FunMatcher>>),
}

impl PatternVariable {
    pub fn new(symbol: Symbol, span: Span) -> Self {
        PatternVariable {
            span,
            symbol,
            occurrences: Cell::new(0),
        }
    }

    /// How many times later passes have compiled this variable into code.
    pub fn occurrences(&self) -> u32 {
        self.occurrences.get()
    }

    pub fn note_occurrence(&self) -> u32 {
        let count = self.occurrences.get() + 1;
        self.occurrences.set(count);
        count
    }
}

impl PatternJoker {
    pub fn new(span: Span) -> Self {
        PatternJoker {
            span,
            occurrences: Cell::new(0),
        }
    }

    pub fn occurrences(&self) -> u32 {
        self.occurrences.get()
    }

    pub fn note_occurrence(&self) -> u32 {
        let count = self.occurrences.get() + 1;
        self.occurrences.set(count);
        count
    }
}

impl Pattern {
    pub fn weight(&self) -> i64 {
        match self {
            Pattern::Constant(_) | Pattern::Variable(_) | Pattern::Joker(_) => LEAF_PATTERN_WEIGHT,
            Pattern::CMatch(m) => m.weight,
            Pattern::FunMatch(m) => m.weight,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Pattern::Constant(c) => c.span,
            Pattern::Variable(v) => v.span,
            Pattern::Joker(j) => j.span,
            Pattern::CMatch(m) => m.span,
            Pattern::FunMatch(m) => m.span,
        }
    }

    /// Direct sub-patterns (the out-patterns of matcher nodes).
    pub fn subpatterns(&self) -> &[Pattern] {
        match self {
            Pattern::CMatch(m) => &m.out_patterns,
            Pattern::FunMatch(m) => &m.out_patterns,
            _ => &[],
        }
    }

    pub fn as_variable(&self) -> Option<&Rc<PatternVariable>> {
        match self {
            Pattern::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Node identity.
    pub fn ptr_eq(&self, other: &Pattern) -> bool {
        match (self, other) {
            (Pattern::Constant(a), Pattern::Constant(b)) => Rc::ptr_eq(a, b),
            (Pattern::Variable(a), Pattern::Variable(b)) => Rc::ptr_eq(a, b),
            (Pattern::Joker(a), Pattern::Joker(b)) => Rc::ptr_eq(a, b),
            (Pattern::CMatch(a), Pattern::CMatch(b)) => Rc::ptr_eq(a, b),
            (Pattern::FunMatch(a), Pattern::FunMatch(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn pretty(&self) -> String {
        match self {
            Pattern::Constant(c) => format!("'{}", c.expr.pretty()),
            Pattern::Variable(v) => format!("?{}", v.symbol),
            Pattern::Joker(_) => "?_".to_string(),
            Pattern::CMatch(m) => pretty_match(m),
            Pattern::FunMatch(m) => pretty_match(m),
        }
    }
}

fn pretty_match<M: Matcher>(node: &MatchPattern<M>) -> String {
    let outs: String = node
        .out_patterns
        .iter()
        .map(|p| format!(" {}", p.pretty()))
        .collect();
    format!(
        "({}{}{})",
        node.matcher.name(),
        pretty_tuple(&node.in_args),
        outs
    )
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

// ============================================================================
// WEIGHTS
// ============================================================================

/// Per-pattern weights plus their aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightSummary {
    pub weights: Vec<i64>,
    pub max: i64,
    pub min: i64,
    pub sum: i64,
}

/// Weighs a sequence of patterns. An empty sequence has all aggregates zero.
///
/// ```rust
/// use mexpand::patterns::{pattern_weight_tuple, Pattern, PatternJoker};
/// use mexpand::ast::Span;
/// use std::rc::Rc;
/// let joker = Pattern::Joker(Rc::new(PatternJoker::new(Span::default())));
/// let summary = pattern_weight_tuple(&[joker.clone(), joker]);
/// assert_eq!((summary.max, summary.min, summary.sum), (1, 1, 2));
/// ```
pub fn pattern_weight_tuple(patterns: &[Pattern]) -> WeightSummary {
    let weights: Vec<i64> = patterns.iter().map(Pattern::weight).collect();
    WeightSummary {
        max: weights.iter().copied().max().unwrap_or(0),
        min: weights.iter().copied().min().unwrap_or(0),
        sum: weights.iter().sum(),
        weights,
    }
}

// ============================================================================
// EXPANSION CONTEXT
// ============================================================================

pub type PatternExpandFn = dyn Fn(&Arc<Sexpr>, &Env, &mut PatternContext) -> Option<Pattern>;

/// The pattern-side closure of a pattern macro.
#[derive(Clone)]
pub struct PatternExpander(Rc<PatternExpandFn>);

impl PatternExpander {
    pub fn new(
        f: impl Fn(&Arc<Sexpr>, &Env, &mut PatternContext) -> Option<Pattern> + 'static,
    ) -> Self {
        PatternExpander(Rc::new(f))
    }

    pub fn call(&self, form: &Arc<Sexpr>, env: &Env, pctx: &mut PatternContext) -> Option<Pattern> {
        (self.0)(form, env, pctx)
    }
}

impl fmt::Debug for PatternExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PatternExpander(..)")
    }
}

/// State for compiling the pattern of one match clause.
pub struct PatternContext {
    pub expander: Expander,
    pub module: ModuleContext,
    vars: HashMap<Symbol, Rc<PatternVariable>>,
    order: Vec<Rc<PatternVariable>>,
}

impl PatternContext {
    pub fn new(expander: Expander, module: ModuleContext) -> Self {
        PatternContext {
            expander,
            module,
            vars: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The variable node for `symbol`, created on first use in this clause.
    pub fn variable(&mut self, symbol: &Symbol, span: Span) -> Rc<PatternVariable> {
        if let Some(existing) = self.vars.get(symbol) {
            return Rc::clone(existing);
        }
        let var = Rc::new(PatternVariable::new(symbol.clone(), span));
        self.vars.insert(symbol.clone(), Rc::clone(&var));
        self.order.push(Rc::clone(&var));
        var
    }

    /// Variables of this clause in first-use order.
    pub fn variables(&self) -> &[Rc<PatternVariable>] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_shared_per_context() {
        let mcx = ModuleContext::new("t", Default::default());
        let mut pctx = PatternContext::new(Expander::standard(), mcx);
        let x = Symbol::intern("x");
        let first = pctx.variable(&x, Span::new(0, 1));
        let second = pctx.variable(&x, Span::new(5, 6));
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(pctx.variables().len(), 1);
        assert_eq!(second.span, Span::new(0, 1));
    }

    #[test]
    fn occurrence_counters_start_at_zero() {
        let var = PatternVariable::new(Symbol::intern("y"), Span::default());
        assert_eq!(var.occurrences(), 0);
        assert_eq!(var.note_occurrence(), 1);
        let joker = PatternJoker::new(Span::default());
        joker.note_occurrence();
        joker.note_occurrence();
        assert_eq!(joker.occurrences(), 2);
    }

    #[test]
    fn empty_weight_tuple_is_zero() {
        assert_eq!(pattern_weight_tuple(&[]), WeightSummary::default());
    }
}
