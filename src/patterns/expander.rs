//! The pattern compiler.
//!
//! - `(? x)` is a pattern variable, `(? _)` the joker.
//! - `(? (matcher in... out...))` applies a matcher: its in-operands are
//!   expanded as expressions and its out-operands compiled as sub-patterns.
//! - Forms headed by a pattern macro run its pattern expander.
//! - Anything else is a constant pattern holding the form's expansion.

use crate::ast::{Form, Sexpr, Span, Symbol};
use crate::binding::{Binding, BindingKind, Env, MatcherRef, PatMacroBinding, Value};
use crate::diagnostics::WarnFlag;
use crate::macros::{expand_operand, ExpansionTuple};
use crate::patterns::{
    pattern_weight_tuple, MatchPattern, Pattern, PatternConstant, PatternContext, PatternJoker,
};
use std::rc::Rc;
use std::sync::Arc;

/// Compiles one pattern form. `span` locates the enclosing clause and is used
/// for atoms, which carry no location of their own.
///
/// Like [`macroexpand_1`](crate::macros::macroexpand_1), this polls for
/// cancellation and counts against the module's nesting limit.
pub fn patternexpand_1(
    form: &Form,
    env: &Env,
    pctx: &mut PatternContext,
    span: Span,
) -> Option<Pattern> {
    if pctx.module.is_cancelled() {
        return None;
    }
    let _guard = pctx.module.enter(form.span().unwrap_or(span))?;
    let sexpr = match form {
        Form::List(sexpr) => sexpr,
        atom => return constant(atom, env, pctx, span),
    };

    match sexpr.operator() {
        Some(Form::Symbol(op)) if op.name() == "?" => question_pattern(sexpr, env, pctx),
        Some(Form::Symbol(op)) => match env.lookup(op) {
            Some(Binding::PatMacro(patmacro)) => {
                call_pattern_macro(op, &patmacro, sexpr, env, pctx)
            }
            _ => constant(form, env, pctx, sexpr.span),
        },
        _ => constant(form, env, pctx, sexpr.span),
    }
}

fn constant(form: &Form, env: &Env, pctx: &PatternContext, span: Span) -> Option<Pattern> {
    let expr = expand_operand(form, env, &pctx.expander, &pctx.module)?;
    Some(Pattern::Constant(Rc::new(PatternConstant { span, expr })))
}

/// Runs a pattern macro's pattern expander one nesting level down.
fn call_pattern_macro(
    op: &Symbol,
    patmacro: &PatMacroBinding,
    sexpr: &Arc<Sexpr>,
    env: &Env,
    pctx: &mut PatternContext,
) -> Option<Pattern> {
    if pctx.module.is_cancelled() {
        return None;
    }
    let _guard = pctx.module.enter(sexpr.span)?;
    pctx.module.record_step(op, BindingKind::PatMacro, sexpr.span);
    patmacro.pattern_expander.call(sexpr, env, pctx)
}

fn question_pattern(sexpr: &Arc<Sexpr>, env: &Env, pctx: &mut PatternContext) -> Option<Pattern> {
    let span = sexpr.span;
    let [operand] = sexpr.rest() else {
        pctx.module.error(
            Some(span),
            "pattern ? expects exactly one operand",
            Some(Form::List(sexpr.clone()).pretty()),
        );
        return None;
    };
    match operand {
        Form::Symbol(symbol) if symbol.name() == "_" => {
            Some(Pattern::Joker(Rc::new(PatternJoker::new(span))))
        }
        Form::Symbol(symbol) if !symbol.is_keyword() => {
            Some(Pattern::Variable(pctx.variable(symbol, span)))
        }
        Form::List(inner) => patternexpand_expr(inner, env, pctx, span),
        other => {
            pctx.module.error(
                Some(span),
                "unexpected pattern ? (neither symbol nor pattern expression)",
                Some(other.pretty()),
            );
            None
        }
    }
}

/// Compiles a pattern expression: a form whose operator is a matcher (or a
/// pattern macro).
pub fn patternexpand_expr(
    sexpr: &Arc<Sexpr>,
    env: &Env,
    pctx: &mut PatternContext,
    span: Span,
) -> Option<Pattern> {
    let Some(Form::Symbol(op)) = sexpr.operator() else {
        pctx.module.error(
            Some(sexpr.span),
            "pattern expression needs a matcher as operator",
            Some(Form::List(sexpr.clone()).pretty()),
        );
        return None;
    };

    let found = env.lookup(op);
    let matcher = match &found {
        Some(Binding::CMatcher { matcher, .. }) => MatcherRef::C(matcher.clone()),
        Some(Binding::FunMatcher(b)) => MatcherRef::Fun(b.matcher.clone()),
        Some(Binding::Value {
            value: Value::CMatcher(matcher),
            ..
        }) => MatcherRef::C(matcher.clone()),
        Some(Binding::Value {
            value: Value::FunMatcher(matcher),
            ..
        }) => MatcherRef::Fun(matcher.clone()),
        Some(Binding::PatMacro(patmacro)) => {
            return call_pattern_macro(op, patmacro, sexpr, env, pctx);
        }
        other => {
            report_not_a_matcher(op, other.as_ref(), sexpr, pctx, span);
            return None;
        }
    };
    pctx.module.record_step(
        op,
        found.as_ref().map_or(BindingKind::Value, Binding::kind),
        sexpr.span,
    );
    patmacexpand_for_matcher(sexpr, env, pctx, matcher)
}

fn report_not_a_matcher(
    op: &Symbol,
    found: Option<&Binding>,
    sexpr: &Arc<Sexpr>,
    pctx: &PatternContext,
    span: Span,
) {
    pctx.module.error(
        Some(span),
        format!("operator {} of pattern expression is not a matcher", op),
        Some(Form::List(sexpr.clone()).pretty()),
    );
    let hint = match found {
        Some(Binding::Value { value, .. }) => {
            format!("{} holds a {} value", op, value.kind_name())
        }
        Some(binding) => format!("{} is bound as a {}", op, binding.kind()),
        None => format!("{} is unbound; define the matcher before this pattern", op),
    };
    pctx.module.inform(Some(sexpr.span), hint, None);
}

/// Builds the matcher node for `(matcher in... out...)`.
pub fn patmacexpand_for_matcher(
    sexpr: &Arc<Sexpr>,
    env: &Env,
    pctx: &mut PatternContext,
    matcher: MatcherRef,
) -> Option<Pattern> {
    let span = sexpr.span;
    let (in_args, out_slots) = compile_match_args(sexpr.rest(), &matcher, env, span, pctx);

    let out_arity = matcher.as_matcher().out_arity();
    if out_slots.len() != out_arity {
        pctx.module.error(
            Some(span),
            format!(
                "bad argument number for matcher {}: {} out patterns for {} outputs",
                matcher.as_matcher().name(),
                out_slots.len(),
                out_arity
            ),
            Some(Form::List(sexpr.clone()).pretty()),
        );
    }
    // A matcher with a hole among its out-patterns cannot be matched; the
    // sub-pattern's failure was already reported.
    let out_patterns = out_slots.into_iter().collect::<Option<Vec<_>>>()?;

    let weight = 1 + pattern_weight_tuple(&out_patterns).sum;
    let pattern = match matcher {
        MatcherRef::C(matcher) => Pattern::CMatch(Rc::new(MatchPattern {
            span,
            weight,
            matcher,
            in_args,
            out_patterns,
        })),
        MatcherRef::Fun(matcher) => Pattern::FunMatch(Rc::new(MatchPattern {
            span,
            weight,
            matcher,
            in_args,
            out_patterns,
        })),
    };
    Some(pattern)
}

/// Splits matcher operands into expanded in-arguments and compiled
/// out-patterns, following the matcher's declared arities. Both come back
/// positional: one slot per operand present, `None` where it yielded nothing.
pub fn compile_match_args(
    operands: &[Form],
    matcher: &MatcherRef,
    env: &Env,
    span: Span,
    pctx: &mut PatternContext,
) -> (ExpansionTuple, Vec<Option<Pattern>>) {
    let declared = matcher.as_matcher();
    let mut operands = operands.iter();

    let mut in_args = Vec::with_capacity(declared.in_arity());
    for rank in 0..declared.in_arity() {
        let Some(operand) = operands.next() else {
            pctx.module.error(
                Some(span),
                format!(
                    "missing in argument #{} for matcher {}",
                    rank + 1,
                    declared.name()
                ),
                None,
            );
            return (in_args, Vec::new());
        };
        in_args.push(expand_operand(operand, env, &pctx.expander, &pctx.module));
    }

    let mut out_patterns = Vec::with_capacity(declared.out_arity());
    for rank in 0..declared.out_arity() {
        let Some(operand) = operands.next() else {
            pctx.module.error(
                Some(span),
                format!(
                    "missing out argument #{} for matcher {}",
                    rank + 1,
                    declared.name()
                ),
                None,
            );
            return (in_args, out_patterns);
        };
        out_patterns.push(patternexpand_1(operand, env, pctx, span));
    }

    let extra = operands.count();
    if extra > 0 {
        pctx.module.warning(
            WarnFlag::Macro,
            Some(span),
            format!(
                "extra stuff after the arguments of matcher {} ({} ignored)",
                declared.name(),
                extra
            ),
            None,
        );
    }
    (in_args, out_patterns)
}
