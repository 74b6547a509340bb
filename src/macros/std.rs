//! Standard macros.
//!
//! These live in the primordial scope, above every initial environment:
//!
//! - `(progn e...)` expands each form and splices the results.
//! - `(quote e)` yields `e` unexpanded.
//! - `(let ((x e)...) body...)` binds lexical variables for its body.
//! - `(match e (pattern body...)...)` compiles each clause's pattern and
//!   expands its body with the pattern variables bound.

use crate::ast::{Form, Sexpr, Symbol};
use crate::binding::{Binding, Env, MacroBinding};
use crate::diagnostics::WarnFlag;
use crate::macros::expander::{expand_body, expand_operand};
use crate::macros::source::{Expansion, MatchClause, Source};
use crate::macros::{Expander, MacroExpander, ModuleContext};
use crate::patterns::{pattern_weight_tuple, patternexpand_1, PatternContext};
use std::sync::Arc;

// ===================================================================================================
// REGISTRATION
// ===================================================================================================

/// Installs every standard macro into `env`.
pub fn install_std_macros(env: &Env) {
    register(env, "progn", expand_progn);
    register(env, "quote", expand_quote);
    register(env, "let", expand_let);
    register(env, "match", expand_match);
}

fn register(
    env: &Env,
    name: &str,
    f: fn(&Arc<Sexpr>, &Env, &Expander, &ModuleContext) -> Option<Expansion>,
) {
    env.install(Binding::Macro(MacroBinding {
        binder: Symbol::intern(name),
        expander: MacroExpander::new(f),
    }));
}

// ===================================================================================================
// SEQUENCING AND QUOTING
// ===================================================================================================

fn expand_progn(
    sexpr: &Arc<Sexpr>,
    env: &Env,
    expander: &Expander,
    mcx: &ModuleContext,
) -> Option<Expansion> {
    Some(Expansion::Many(expand_body(sexpr.rest(), env, expander, mcx)))
}

fn expand_quote(
    sexpr: &Arc<Sexpr>,
    _env: &Env,
    _expander: &Expander,
    mcx: &ModuleContext,
) -> Option<Expansion> {
    match sexpr.rest() {
        [quoted] => Some(Expansion::Literal(quoted.clone())),
        _ => {
            mcx.error(
                Some(sexpr.span),
                "quote expects exactly one argument",
                Some(Form::List(sexpr.clone()).pretty()),
            );
            None
        }
    }
}

// ===================================================================================================
// LEXICAL BINDING
// ===================================================================================================

fn expand_let(
    sexpr: &Arc<Sexpr>,
    env: &Env,
    expander: &Expander,
    mcx: &ModuleContext,
) -> Option<Expansion> {
    let span = sexpr.span;
    let Some((Form::List(binding_list), body_forms)) = sexpr.rest().split_first() else {
        mcx.error(
            Some(span),
            "let expects a list of bindings",
            Some(Form::List(sexpr.clone()).pretty()),
        );
        return None;
    };

    let body_env = env.extend();
    let mut bindings = Vec::with_capacity(binding_list.contents.len());
    for entry in &binding_list.contents {
        let (name, init) = match entry.as_sexpr().map(|s| s.contents.as_slice()) {
            Some([Form::Symbol(name), init]) if !name.is_keyword() => (name, init),
            _ => {
                mcx.error(
                    Some(binding_list.span),
                    "bad let binding, expecting (name expression)",
                    Some(entry.pretty()),
                );
                continue;
            }
        };
        let Some(value) = expand_operand(init, env, expander, mcx) else {
            continue;
        };
        body_env.install(Binding::Let {
            binder: name.clone(),
        });
        bindings.push((name.clone(), value));
    }

    if body_forms.is_empty() {
        mcx.warning(WarnFlag::Macro, Some(span), "empty body in let", None);
    }
    let body = expand_body(body_forms, &body_env, expander, mcx);
    Some(Expansion::node(Source::Let {
        span,
        bindings,
        body,
    }))
}

// ===================================================================================================
// PATTERN MATCHING
// ===================================================================================================

fn expand_match(
    sexpr: &Arc<Sexpr>,
    env: &Env,
    expander: &Expander,
    mcx: &ModuleContext,
) -> Option<Expansion> {
    let span = sexpr.span;
    let Some((matched, clause_forms)) = sexpr.rest().split_first() else {
        mcx.error(Some(span), "missing matched expression in match", None);
        return None;
    };
    let matched = expand_operand(matched, env, expander, mcx)?;

    if clause_forms.is_empty() {
        mcx.warning(WarnFlag::Macro, Some(span), "match without clauses", None);
    }

    let mut clauses = Vec::with_capacity(clause_forms.len());
    for clause_form in clause_forms {
        let Some((pattern_form, body_forms)) = clause_form
            .as_sexpr()
            .and_then(|clause| clause.contents.split_first())
        else {
            mcx.error(
                Some(span),
                "match clause should be a (pattern body...) list",
                Some(clause_form.pretty()),
            );
            continue;
        };
        let clause_span = clause_form.span().unwrap_or(span);

        let mut pctx = PatternContext::new(expander.clone(), mcx.clone());
        let Some(pattern) = patternexpand_1(pattern_form, env, &mut pctx, clause_span) else {
            continue;
        };

        let body_env = env.extend();
        for var in pctx.variables() {
            body_env.install(Binding::Let {
                binder: var.symbol.clone(),
            });
        }
        let body = expand_body(body_forms, &body_env, expander, mcx);
        clauses.push(MatchClause {
            span: clause_span,
            pattern,
            variables: pctx.variables().to_vec(),
            body,
        });
    }

    let weights = pattern_weight_tuple(
        &clauses
            .iter()
            .map(|clause| clause.pattern.clone())
            .collect::<Vec<_>>(),
    );
    Some(Expansion::node(Source::Match {
        span,
        matched,
        clauses,
        max_weight: weights.max,
        min_weight: weights.min,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::macros::{macroexpand_1, ExpandOptions};

    fn setup() -> (Env, ModuleContext) {
        let env = Env::root();
        install_std_macros(&env);
        (env.extend(), ModuleContext::new("std", ExpandOptions::default()))
    }

    #[test]
    fn quote_keeps_the_form() {
        let (env, mcx) = setup();
        let quoted = Form::list(vec![Form::sym("undefined-op")], Span::new(7, 21));
        let form = Form::list(vec![Form::sym("quote"), quoted.clone()], Span::new(0, 22));
        let out = macroexpand_1(&form, &env, None, &mcx).unwrap();
        assert_eq!(out.as_literal(), Some(&quoted));
    }

    #[test]
    fn let_binds_for_its_body_only() {
        let (env, mcx) = setup();
        let binding = Form::list(vec![Form::sym("lx"), Form::Integer(1)], Span::new(6, 12));
        let bindings = Form::list(vec![binding], Span::new(5, 13));
        let body = Form::list(vec![Form::sym("lx"), Form::Integer(2)], Span::new(14, 20));
        let form = Form::list(vec![Form::sym("let"), bindings, body], Span::new(0, 21));
        let out = macroexpand_1(&form, &env, None, &mcx).unwrap();
        let Some(Source::Let { bindings, body, .. }) = out.as_source() else {
            panic!("expected a let node");
        };
        assert_eq!(bindings.len(), 1);
        // `lx` is a let binding inside the body, so the call is an application.
        assert!(matches!(body[0].as_source(), Some(Source::Apply { .. })));
        assert!(!env.is_bound(&Symbol::intern("lx")));
    }

    #[test]
    fn progn_yields_many() {
        let (env, mcx) = setup();
        let form = Form::list(
            vec![Form::sym("progn"), Form::Integer(1), Form::Integer(2)],
            Span::new(0, 11),
        );
        let out = macroexpand_1(&form, &env, None, &mcx).unwrap();
        assert!(matches!(out, Expansion::Many(ref items) if items.len() == 2));
    }
}
