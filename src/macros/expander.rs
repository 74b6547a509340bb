//! The single-form dispatcher.
//!
//! [`macroexpand_1`] resolves the operator of a compound form and picks the
//! node shape from the kind of binding it finds. Every sub-form goes back
//! through the active [`Expander`].
//!
//! ## Error Handling
//!
//! Shape and arity problems are reported through the [`ModuleContext`] and
//! expand to `None`, except where a best-effort node is more useful to the
//! code generator (citerations, matcher expressions). Nothing here returns a
//! `Result`: one bad form never stops its siblings.

use crate::ast::{Form, Sexpr, Symbol};
use crate::binding::{Binding, CIterator, Env, Field, Hook, MatcherRef, Primitive, Value};
use crate::diagnostics::WarnFlag;
use crate::macros::formals::bind_formals;
use crate::macros::source::{Deferred, Expansion, ExpansionTuple, Source};
use crate::macros::{Expander, ModuleContext};
use std::sync::Arc;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Expands one form.
///
/// Atoms come back unchanged. Compound forms dispatch on their operator; with
/// no `expander` given, the standard one drives recursion.
pub fn macroexpand_1(
    form: &Form,
    env: &Env,
    expander: Option<&Expander>,
    mcx: &ModuleContext,
) -> Option<Expansion> {
    if mcx.is_cancelled() {
        return None;
    }
    let sexpr = match form {
        Form::List(sexpr) => sexpr,
        atom => return Some(Expansion::Literal(atom.clone())),
    };

    let standard;
    let expander = match expander {
        Some(expander) => expander,
        None => {
            standard = Expander::standard();
            &standard
        }
    };
    let _guard = mcx.enter(sexpr.span)?;

    let Some(operator) = sexpr.operator() else {
        mcx.warning(
            WarnFlag::Macro,
            Some(sexpr.span),
            "degenerate empty form",
            None,
        );
        return None;
    };

    let call = Call {
        sexpr,
        env,
        expander,
        mcx,
    };
    match operator {
        Form::Symbol(symbol) if symbol.is_keyword() => call.keyword_operator(symbol),
        Form::Symbol(symbol) => match env.lookup(symbol) {
            Some(binding) => call.dispatch(symbol, binding),
            None => call.unbound(symbol),
        },
        _ => call.apply(),
    }
}

/// Expands each operand in order, one slot per operand. A slot is `None` when
/// its operand expanded to nothing; that has already been reported.
pub fn expand_restlist_as_tuple(
    forms: &[Form],
    env: &Env,
    expander: &Expander,
    mcx: &ModuleContext,
) -> ExpansionTuple {
    forms
        .iter()
        .map(|form| expand_operand(form, env, expander, mcx))
        .collect()
}

/// Expands a form that must yield exactly one value.
///
/// A multi-valued result (`progn` with several forms) only makes sense at the
/// toplevel, where it is spliced. Here a single value is unwrapped and
/// anything else is reported.
pub fn expand_operand(
    form: &Form,
    env: &Env,
    expander: &Expander,
    mcx: &ModuleContext,
) -> Option<Expansion> {
    let mut value = expander.expand(form, env, mcx)?;
    loop {
        match value {
            Expansion::Many(mut items) if items.len() == 1 => value = items.pop()?,
            Expansion::Many(items) => {
                mcx.error(
                    form.span(),
                    format!("{} values where a single operand is expected", items.len()),
                    Some(form.pretty()),
                );
                return None;
            }
            single => return Some(single),
        }
    }
}

/// Expands a body: a statement sequence where null results contribute
/// nothing, as at the toplevel.
pub fn expand_body(
    forms: &[Form],
    env: &Env,
    expander: &Expander,
    mcx: &ModuleContext,
) -> Vec<Expansion> {
    forms
        .iter()
        .filter_map(|form| expander.expand(form, env, mcx))
        .collect()
}

// ============================================================================
// DISPATCH
// ============================================================================

struct Call<'a> {
    sexpr: &'a Arc<Sexpr>,
    env: &'a Env,
    expander: &'a Expander,
    mcx: &'a ModuleContext,
}

impl<'a> Call<'a> {
    fn rest(&self) -> &'a [Form] {
        self.sexpr.rest()
    }

    fn subject(&self) -> Option<String> {
        Some(Form::List(self.sexpr.clone()).pretty())
    }

    fn tuple(&self, forms: &[Form]) -> ExpansionTuple {
        expand_restlist_as_tuple(forms, self.env, self.expander, self.mcx)
    }

    fn operand(&self, form: &Form) -> Option<Expansion> {
        expand_operand(form, self.env, self.expander, self.mcx)
    }

    fn dispatch(&self, operator: &Symbol, binding: Binding) -> Option<Expansion> {
        self.mcx
            .record_step(operator, binding.kind(), self.sexpr.span);
        match binding {
            Binding::Macro(m) => m
                .expander
                .call(self.sexpr, self.env, self.expander, self.mcx),
            Binding::PatMacro(m) => {
                m.macro_expander
                    .call(self.sexpr, self.env, self.expander, self.mcx)
            }
            Binding::Selector { binder } => self.msend(&binder),
            Binding::Primitive { primitive, .. } => self.primitive(operator, primitive),
            Binding::CIterator { citerator, .. } => self.citeration(citerator),
            Binding::Hook { hook, .. } => self.hook_call(operator, hook),
            Binding::CMatcher { matcher, .. } => self.matcher_expr(MatcherRef::C(matcher)),
            Binding::FunMatcher(b) => self.matcher_expr(MatcherRef::Fun(b.matcher)),
            Binding::Field { binder, field } => {
                if binder != field.name {
                    self.mcx.error(
                        Some(self.sexpr.span),
                        format!(
                            "field binding {} disagrees with its field descriptor {}",
                            binder, field.name
                        ),
                        self.subject(),
                    );
                    return None;
                }
                self.get_field(operator, field)
            }
            Binding::Formal(_) | Binding::Let { .. } => self.apply(),
            Binding::Value { value, .. } => self.value_call(operator, value),
        }
    }

    fn value_call(&self, operator: &Symbol, value: Value) -> Option<Expansion> {
        match value {
            Value::Closure(_) => self.apply(),
            Value::Primitive(primitive) => self.primitive(operator, primitive),
            Value::Selector(selector) => self.msend(&selector),
            Value::CIterator(citerator) => self.citeration(citerator),
            Value::Hook(hook) => self.hook_call(operator, hook),
            Value::CMatcher(matcher) => self.matcher_expr(MatcherRef::C(matcher)),
            Value::FunMatcher(matcher) => self.matcher_expr(MatcherRef::Fun(matcher)),
            Value::Field(field) => self.get_field(operator, field),
            other => {
                self.mcx.error(
                    Some(self.sexpr.span),
                    format!(
                        "operator {} is bound to a non-callable {} value",
                        operator,
                        other.kind_name()
                    ),
                    Some(other.to_string()),
                );
                self.mcx.inform(
                    Some(self.sexpr.span),
                    "callable values are closures, primitives, selectors, citerators, hooks, matchers and fields",
                    None,
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Operators without a usable binding
    // ------------------------------------------------------------------------

    fn keyword_operator(&self, keyword: &Symbol) -> Option<Expansion> {
        self.mcx.error(
            Some(self.sexpr.span),
            format!("keyword {} cannot be used as an operator", keyword),
            self.subject(),
        );
        self.mcx.inform(
            Some(self.sexpr.span),
            "keywords only have meaning inside constructs that read them, such as formal arglists",
            None,
        );
        None
    }

    fn unbound(&self, operator: &Symbol) -> Option<Expansion> {
        if !self.mcx.is_bootstrapping() {
            return Some(Expansion::node(Source::LazyMacroExpansion(Deferred {
                form: self.sexpr.clone(),
                env: self.env.clone(),
                expander: self.expander.clone(),
                module: self.mcx.clone(),
                operator: operator.clone(),
            })));
        }
        self.mcx.warning(
            WarnFlag::Bootstrap,
            Some(self.sexpr.span),
            format!("unbound operator {} applied as a function", operator),
            None,
        );
        self.apply()
    }

    // ------------------------------------------------------------------------
    // Node builders
    // ------------------------------------------------------------------------

    fn apply(&self) -> Option<Expansion> {
        let operator = self.sexpr.operator()?;
        let fun = if operator.is_compound() {
            self.operand(operator)?
        } else {
            Expansion::Literal(operator.clone())
        };
        Some(Expansion::node(Source::Apply {
            span: self.sexpr.span,
            fun,
            args: self.tuple(self.rest()),
        }))
    }

    fn msend(&self, selector: &Symbol) -> Option<Expansion> {
        let Some((receiver, args)) = self.rest().split_first() else {
            self.mcx.error(
                Some(self.sexpr.span),
                format!("missing receiver expression in send of {}", selector),
                self.subject(),
            );
            return None;
        };
        let receiver = if receiver.is_compound() {
            self.operand(receiver)?
        } else {
            Expansion::Literal(receiver.clone())
        };
        Some(Expansion::node(Source::Msend {
            span: self.sexpr.span,
            selector: selector.clone(),
            receiver,
            args: self.tuple(args),
        }))
    }

    fn primitive(&self, operator: &Symbol, primitive: Arc<Primitive>) -> Option<Expansion> {
        let count = self.rest().len();
        if !primitive.formals.accepts(count) {
            self.mcx.error(
                Some(self.sexpr.span),
                format!(
                    "primitive {} expects {} arguments, got {}",
                    primitive.name,
                    primitive.formals.arity_description(),
                    count
                ),
                self.subject(),
            );
            return None;
        }
        Some(Expansion::node(Source::Primitive {
            span: self.sexpr.span,
            operator: operator.clone(),
            args: self.tuple(self.rest()),
            primitive,
        }))
    }

    fn hook_call(&self, operator: &Symbol, hook: Arc<Hook>) -> Option<Expansion> {
        let count = self.rest().len();
        if !hook.in_formals.accepts(count) {
            self.mcx.error(
                Some(self.sexpr.span),
                format!(
                    "hook {} expects {} arguments, got {}",
                    hook.name,
                    hook.in_formals.arity_description(),
                    count
                ),
                self.subject(),
            );
            return None;
        }
        Some(Expansion::node(Source::HookCall {
            span: self.sexpr.span,
            operator: operator.clone(),
            args: self.tuple(self.rest()),
            hook,
        }))
    }

    fn citeration(&self, citerator: Arc<CIterator>) -> Option<Expansion> {
        let span = self.sexpr.span;
        let rest = self.rest();

        let start_args = match rest.first() {
            Some(Form::List(start)) => self.tuple(&start.contents),
            Some(other) => {
                self.mcx.error(
                    Some(span),
                    format!("startargs of citeration {} should be a list", citerator.name),
                    Some(other.pretty()),
                );
                Vec::new()
            }
            None => {
                self.mcx.error(
                    Some(span),
                    format!("missing startargs in citeration {}", citerator.name),
                    self.subject(),
                );
                Vec::new()
            }
        };
        if let Some(Form::List(start)) = rest.first() {
            if !citerator.start_formals.accepts(start.contents.len()) {
                self.mcx.error(
                    Some(span),
                    format!(
                        "citeration {} expects {} start arguments, got {}",
                        citerator.name,
                        citerator.start_formals.arity_description(),
                        start.contents.len()
                    ),
                    None,
                );
            }
        }

        let loop_formals = match rest.get(1) {
            Some(formals) => {
                bind_formals(Some(formals), self.mcx.options().check_formal_types, self.mcx)
            }
            None => {
                self.mcx.error(
                    Some(span),
                    format!("missing varformals in citeration {}", citerator.name),
                    self.subject(),
                );
                bind_formals(None, false, self.mcx)
            }
        };
        if rest.len() > 1 && loop_formals.len() != citerator.loop_formals.len() {
            self.mcx.error(
                Some(span),
                format!(
                    "citeration {} binds {} loop variables, got {}",
                    citerator.name,
                    citerator.loop_formals.len(),
                    loop_formals.len()
                ),
                None,
            );
        }

        let body_forms = rest.get(2..).unwrap_or(&[]);
        if body_forms.is_empty() {
            self.mcx.warning(
                WarnFlag::Macro,
                Some(span),
                format!("empty body in citeration {}", citerator.name),
                None,
            );
        }
        let body_env = self.env.extend();
        for formal in loop_formals.iter() {
            body_env.install(Binding::Formal(formal.clone()));
        }
        let body = expand_body(body_forms, &body_env, self.expander, self.mcx);

        Some(Expansion::node(Source::CIteration {
            span,
            citerator,
            start_args,
            loop_formals,
            body,
        }))
    }

    fn matcher_expr(&self, matcher: MatcherRef) -> Option<Expansion> {
        let span = self.sexpr.span;
        let count = self.rest().len();
        let expected = matcher.as_matcher().in_arity();
        if count != expected {
            self.mcx.error(
                Some(span),
                format!(
                    "bad argument number for matcher {}: expected {}, got {}",
                    matcher.as_matcher().name(),
                    expected,
                    count
                ),
                self.subject(),
            );
        }
        let args = self.tuple(self.rest());
        let source = match matcher {
            MatcherRef::C(matcher) => Source::CMatchExpr {
                span,
                matcher,
                args,
            },
            MatcherRef::Fun(matcher) => Source::FunMatchExpr {
                span,
                matcher,
                args,
            },
        };
        Some(Expansion::node(source))
    }

    fn get_field(&self, operator: &Symbol, field: Arc<Field>) -> Option<Expansion> {
        let [object] = self.rest() else {
            self.mcx.error(
                Some(self.sexpr.span),
                format!("expecting one argument in ({} <subexpr>)", operator),
                self.subject(),
            );
            return None;
        };
        let object = self.operand(object)?;
        Some(Expansion::node(Source::GetField {
            span: self.sexpr.span,
            field,
            object,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;
    use crate::binding::{Closure, FormalList};
    use crate::diagnostics::CollectingSink;
    use crate::macros::ExpandOptions;
    use std::rc::Rc;

    fn setup(options: ExpandOptions) -> (Env, ModuleContext, Rc<CollectingSink>) {
        let sink = Rc::new(CollectingSink::new());
        let mcx = ModuleContext::with_sink("expander", options, sink.clone());
        (Env::root(), mcx, sink)
    }

    fn call(items: Vec<Form>) -> Form {
        Form::list(items, Span::new(0, 20))
    }

    fn expand(form: &Form, env: &Env, mcx: &ModuleContext) -> Option<Expansion> {
        macroexpand_1(form, env, None, mcx)
    }

    #[test]
    fn atoms_are_returned_unchanged() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        for atom in [Form::Integer(4), Form::sym("x"), Form::String("s".into())] {
            let out = expand(&atom, &env, &mcx).unwrap();
            assert_eq!(out.as_literal(), Some(&atom));
        }
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn empty_form_warns() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        assert!(expand(&call(vec![]), &env, &mcx).is_none());
        assert!(sink.mentions("degenerate empty form"));
    }

    #[test]
    fn keyword_operator_is_rejected() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        assert!(expand(&call(vec![Form::sym(":long"), Form::Integer(1)]), &env, &mcx).is_none());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn unbound_operator_defers_outside_bootstrap() {
        let (env, mcx, _) = setup(ExpandOptions::default());
        let out = expand(&call(vec![Form::sym("later"), Form::Integer(1)]), &env, &mcx).unwrap();
        let deferred = out.as_deferred().unwrap();
        assert_eq!(deferred.operator, Symbol::intern("later"));
        assert!(deferred.env.ptr_eq(&env));
        assert!(!deferred.is_resolvable());
    }

    #[test]
    fn unbound_operator_applies_while_bootstrapping() {
        let (env, mcx, sink) = setup(ExpandOptions {
            bootstrap: true,
            ..Default::default()
        });
        let out = expand(&call(vec![Form::sym("later"), Form::Integer(1)]), &env, &mcx).unwrap();
        assert!(matches!(out.as_source(), Some(Source::Apply { args, .. }) if args.len() == 1));
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn primitive_arity_is_checked() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        env.install(Binding::primitive(Primitive::new(
            "prim_add",
            FormalList::fixed(&["a", "b"]),
            &crate::ast::ctype::CTYPE_LONG,
        )));
        let ok = expand(
            &call(vec![Form::sym("prim_add"), Form::Integer(1), Form::Integer(2)]),
            &env,
            &mcx,
        );
        assert!(matches!(ok.unwrap().as_source(), Some(Source::Primitive { args, .. }) if args.len() == 2));
        let bad = expand(&call(vec![Form::sym("prim_add"), Form::Integer(1)]), &env, &mcx);
        assert!(bad.is_none());
        assert!(sink.mentions("expects exactly 2 arguments, got 1"));
    }

    #[test]
    fn field_needs_exactly_one_argument() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        env.install(Binding::field(Field::new("named_name", "class_named", 1)));
        let ok = expand(&call(vec![Form::sym("named_name"), Form::sym("obj")]), &env, &mcx);
        assert!(matches!(ok.unwrap().as_source(), Some(Source::GetField { .. })));
        let bad = expand(&call(vec![Form::sym("named_name")]), &env, &mcx);
        assert!(bad.is_none());
        assert!(sink.mentions("expecting one argument in (named_name <subexpr>)"));
    }

    #[test]
    fn closure_value_is_applied() {
        let (env, mcx, _) = setup(ExpandOptions::default());
        env.install(Binding::value(
            "fclo",
            Value::Closure(Arc::new(Closure {
                name: Some(Symbol::intern("fclo")),
                routine: Symbol::intern("rout_fclo"),
                captured: vec![],
            })),
        ));
        let out = expand(&call(vec![Form::sym("fclo"), Form::Integer(3)]), &env, &mcx).unwrap();
        assert!(matches!(out.as_source(), Some(Source::Apply { .. })));
    }

    #[test]
    fn non_callable_value_names_its_kind() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        env.install(Binding::value("answer", Value::Integer(42)));
        assert!(expand(&call(vec![Form::sym("answer")]), &env, &mcx).is_none());
        assert!(sink.mentions("non-callable integer value"));
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn cancelled_context_expands_nothing() {
        let (env, mcx, _) = setup(ExpandOptions::default());
        mcx.cancel_token().cancel();
        assert!(expand(&Form::Integer(1), &env, &mcx).is_none());
    }

    #[test]
    fn null_arguments_keep_their_slot() {
        let (env, mcx, sink) = setup(ExpandOptions::default());
        env.install(Binding::primitive(Primitive::new(
            "prim_sub",
            FormalList::fixed(&["a", "b"]),
            &crate::ast::ctype::CTYPE_LONG,
        )));
        let out = expand(
            &call(vec![
                Form::sym("prim_sub"),
                Form::list(vec![], Span::new(5, 7)),
                Form::Integer(2),
            ]),
            &env,
            &mcx,
        )
        .unwrap();
        match out.as_source() {
            Some(Source::Primitive { primitive, args, .. }) => {
                assert_eq!(args.len(), primitive.formals.len());
                assert!(args[0].is_none());
                assert_eq!(args[1].as_ref().and_then(Expansion::as_literal), Some(&Form::Integer(2)));
            }
            other => panic!("expected a primitive, got {:?}", other),
        }
        assert!(sink.mentions("degenerate empty form"));
        assert_eq!(out.pretty(), "(primitive prim_sub () 2)");
    }

    #[test]
    fn single_valued_progn_is_an_operand() {
        let env = crate::macros::initial_env().extend();
        let (_, mcx, sink) = setup(ExpandOptions::default());
        env.install(Binding::selector("show"));
        let one = call(vec![
            Form::sym("show"),
            Form::list(vec![Form::sym("progn"), Form::sym("obj")], Span::new(1, 4)),
        ]);
        let out = expand(&one, &env, &mcx).unwrap();
        assert!(matches!(out.as_source(), Some(Source::Msend { receiver, .. })
            if receiver.as_literal() == Some(&Form::sym("obj"))));

        let two = call(vec![
            Form::sym("show"),
            Form::sym("obj"),
            Form::list(
                vec![Form::sym("progn"), Form::Integer(1), Form::Integer(2)],
                Span::new(5, 9),
            ),
        ]);
        let out = expand(&two, &env, &mcx).unwrap();
        assert!(matches!(out.as_source(), Some(Source::Msend { args, .. })
            if args.len() == 1 && args[0].is_none()));
        assert!(sink.mentions("2 values where a single operand is expected"));
    }
}
