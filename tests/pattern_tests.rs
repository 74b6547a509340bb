mod common;

use common::*;
use mexpand::ast::{Form, Sexpr, Symbol};
use mexpand::binding::{Binding, FormalList, FunMatcher, Value};
use mexpand::macros::{install_patmacro, Expander, Expansion, MacroExpander, MatchClause, Source};
use mexpand::patterns::{
    pattern_weight_tuple, patternexpand_1, patternexpand_expr, Pattern, PatternContext,
    PatternExpander,
};
use std::rc::Rc;
use std::sync::Arc;

fn match_clauses(fx: &Fixture, json: &str) -> (Vec<MatchClause>, i64, i64) {
    let node = fx.expand_node(json);
    match &*node {
        Source::Match {
            clauses,
            max_weight,
            min_weight,
            ..
        } => (clauses.clone(), *max_weight, *min_weight),
        other => panic!("expected a match node, got {:?}", other),
    }
}

fn assert_monotonic(pattern: &Pattern) {
    for child in pattern.subpatterns() {
        assert!(pattern.weight() > child.weight(), "{} vs {}", pattern, child);
        assert_monotonic(child);
    }
}

#[test]
fn repeated_variable_in_one_clause_is_one_node() {
    let fx = Fixture::new();
    fx.install(pair_matcher());
    let (clauses, _, _) = match_clauses(
        &fx,
        r#"["match", "subject", [["?", ["pair_of", 0, ["?", "x"], ["?", "x"]]], "x"]]"#,
    );
    let outs = clauses[0].pattern.subpatterns();
    assert_eq!(outs.len(), 2);
    assert!(outs[0].ptr_eq(&outs[1]));
    assert_eq!(clauses[0].variables.len(), 1);
    assert!(fx.sink.diagnostics().is_empty());
}

#[test]
fn clauses_do_not_share_variables() {
    let fx = Fixture::new();
    let (clauses, _, _) = match_clauses(
        &fx,
        r#"["match", "subject", [["?", "x"], 1], [["?", "x"], 2], [["?", "_"], 3]]"#,
    );
    assert_eq!(clauses.len(), 3);
    assert!(!clauses[0].pattern.ptr_eq(&clauses[1].pattern));
    assert_eq!(clauses[1].variables.len(), 1);
    assert!(clauses[2].variables.is_empty());
}

#[test]
fn fresh_context_starts_empty() {
    let fx = Fixture::new();
    let mut first = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let x1 = patternexpand_1(&form(r#"["?", "x"]"#), &fx.env, &mut first, Default::default()).unwrap();
    let x2 = patternexpand_1(&form(r#"["?", "x"]"#), &fx.env, &mut first, Default::default()).unwrap();
    assert!(x1.ptr_eq(&x2));

    let mut third = PatternContext::new(Expander::standard(), fx.mcx.clone());
    assert!(third.variables().is_empty());
    let x3 = patternexpand_1(&form(r#"["?", "x"]"#), &fx.env, &mut third, Default::default()).unwrap();
    assert!(!x1.ptr_eq(&x3));
}

#[test]
fn clause_bodies_see_pattern_variables() {
    let fx = Fixture::new();
    let (clauses, _, _) = match_clauses(&fx, r#"["match", "s", [["?", "f"], ["f", 1], ["g", 2]]]"#);
    let body = &clauses[0].body;
    assert!(matches!(body[0].as_source(), Some(Source::Apply { .. })));
    assert!(body[1].as_deferred().is_some());
}

#[test]
fn match_records_weight_summary() {
    let fx = Fixture::new();
    fx.install(pair_matcher());
    let (clauses, max, min) = match_clauses(
        &fx,
        r#"["match", "s",
            [["?", ["pair_of", 1, ["?", ["pair_of", 2, ["?", "a"], ["?", "b"]]], 0]], "a"],
            [["?", "_"], 0]]"#,
    );
    let weights: Vec<i64> = clauses.iter().map(MatchClause::weight).collect();
    assert_eq!(weights, vec![5, 1]);
    assert_eq!((max, min), (5, 1));
    for clause in &clauses {
        assert_monotonic(&clause.pattern);
    }
}

#[test]
fn weight_tuple_aggregates() {
    let fx = Fixture::new();
    fx.install(pair_matcher());
    let mut pctx = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let patterns: Vec<Pattern> = [
        r#"["?", "a"]"#,
        r#"["?", ["pair_of", 0, ["?", "b"], ["?", "c"]]]"#,
        "3",
    ]
    .iter()
    .map(|json| patternexpand_1(&form(json), &fx.env, &mut pctx, Default::default()).unwrap())
    .collect();
    let summary = pattern_weight_tuple(&patterns);
    assert_eq!(summary.weights, vec![1, 3, 1]);
    assert_eq!((summary.max, summary.min, summary.sum), (3, 1, 5));
}

#[test]
fn non_matcher_heads_are_constant_patterns() {
    let fx = Fixture::new();
    fx.install(Binding::selector("discrim"));
    let mut pctx = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let pattern =
        patternexpand_1(&form(r#"["discrim", "v"]"#), &fx.env, &mut pctx, Default::default()).unwrap();
    let Pattern::Constant(constant) = &pattern else {
        panic!("expected a constant pattern");
    };
    assert!(matches!(constant.expr.as_source(), Some(Source::Msend { .. })));
    assert_eq!(pattern.weight(), 1);
}

#[test]
fn funmatcher_held_in_a_value() {
    let fx = Fixture::new();
    fx.install(Binding::value(
        "is_some",
        Value::FunMatcher(Arc::new(FunMatcher::new(
            "some_value",
            FormalList::default(),
            FormalList::fixed(&["v"]),
        ))),
    ));
    let mut pctx = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let pattern = patternexpand_1(
        &form(r#"["?", ["is_some", ["?", "inner"]]]"#),
        &fx.env,
        &mut pctx,
        Default::default(),
    )
    .unwrap();
    let Pattern::FunMatch(node) = &pattern else {
        panic!("expected a funmatcher pattern, got {}", pattern);
    };
    assert_eq!(node.matcher.name.name(), "some_value");
    assert_eq!(node.weight, 2);
    assert_eq!(pctx.variables()[0].symbol, Symbol::intern("inner"));
}

#[test]
fn unbound_matcher_is_reported_with_a_hint() {
    let fx = Fixture::new();
    let mut pctx = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let out = patternexpand_1(
        &form(r#"["?", ["nowhere", 1]]"#),
        &fx.env,
        &mut pctx,
        Default::default(),
    );
    assert!(out.is_none());
    assert_eq!(fx.sink.error_count(), 1);
    assert!(fx.sink.mentions("nowhere is unbound"));
}

#[test]
fn pattern_macro_works_in_both_positions() {
    let fx = Fixture::new();
    fx.install(pair_matcher());

    // (pair0 l r) is (pair_of 0 l r) in patterns, and the literal 0 in code.
    let pattern_side = PatternExpander::new(|sexpr: &Arc<Sexpr>, env, pctx: &mut PatternContext| {
        let mut contents = vec![Form::sym("pair_of"), Form::Integer(0)];
        contents.extend(sexpr.rest().iter().cloned());
        let rewritten = Arc::new(Sexpr::new(contents, sexpr.span));
        patternexpand_expr(&rewritten, env, pctx, sexpr.span)
    });
    let expression_side =
        MacroExpander::new(|_, _, _, _| Some(Expansion::Literal(Form::Integer(0))));
    install_patmacro(&Symbol::intern("pair0"), pattern_side, expression_side, &fx.mcx);

    let out = fx.expand(r#"["pair0", 1, 2]"#).unwrap();
    assert_eq!(literal(&out), &Form::Integer(0));

    let mut pctx = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let direct = patternexpand_1(
        &form(r#"["pair0", ["?", "l"], ["?", "r"]]"#),
        &fx.env,
        &mut pctx,
        Default::default(),
    )
    .unwrap();
    assert!(matches!(direct, Pattern::CMatch(_)));
    assert_eq!(direct.weight(), 3);

    let nested = patternexpand_1(
        &form(r#"["?", ["pair0", ["?", "l"], 5]]"#),
        &fx.env,
        &mut pctx,
        Default::default(),
    )
    .unwrap();
    assert_eq!(nested.weight(), 3);
    assert_eq!(pctx.variables().len(), 2);
    assert!(fx.sink.diagnostics().is_empty());
}

#[test]
fn occurrence_counters_are_shared_through_the_node() {
    let fx = Fixture::new();
    let mut pctx = PatternContext::new(Expander::standard(), fx.mcx.clone());
    let pattern = patternexpand_1(&form(r#"["?", "y"]"#), &fx.env, &mut pctx, Default::default()).unwrap();
    let var = pattern.as_variable().unwrap();
    var.note_occurrence();
    assert_eq!(pctx.variables()[0].occurrences(), 1);
    assert!(Rc::ptr_eq(var, &pctx.variables()[0]));
}
