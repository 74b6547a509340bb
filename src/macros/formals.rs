//! The formal argument list binder.
//!
//! Turns a list such as `(a :long n :rest more)` into a [`FormalList`]. Ctype
//! keywords declare the type of the next plain symbol; `:rest` makes the list
//! variadic and may name one final binder for the surplus arguments.

use crate::ast::ctype::{CType, CTYPE_VALUE};
use crate::ast::{Form, Span, Symbol};
use crate::binding::{FormalKind, FormalList};
use crate::diagnostics::WarnFlag;
use crate::macros::ModuleContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestState {
    Before,
    Open,
    Bound,
}

/// Binds a formal argument list. A missing list is an empty fixed list.
///
/// Every problem is reported through `mcx`; the returned list holds whatever
/// could be bound.
pub fn bind_formals(formals: Option<&Form>, check_types: bool, mcx: &ModuleContext) -> FormalList {
    let mut list = FormalList::new(FormalKind::Fixed);
    let Some(form) = formals else {
        return list;
    };
    let sexpr = match form {
        Form::List(sexpr) => sexpr,
        other => {
            mcx.error(
                None,
                "formal arglist should be a list",
                Some(other.pretty()),
            );
            return list;
        }
    };
    let span = sexpr.span;

    let mut pending: Option<(&'static CType, Symbol)> = None;
    let mut rest = RestState::Before;

    for token in &sexpr.contents {
        let Form::Symbol(symbol) = token else {
            mcx.error(
                Some(span),
                "unexpected argument in formal arglist",
                Some(token.pretty()),
            );
            continue;
        };

        if symbol.is_keyword() {
            match symbol.name() {
                ":rest" => {
                    if rest != RestState::Before {
                        mcx.error(Some(span), "repeated :rest in formal arglist", None);
                        continue;
                    }
                    list.kind = FormalKind::Variadic;
                    rest = RestState::Open;
                }
                ":auto" => {
                    mcx.error(
                        Some(span),
                        ":auto is not allowed in formal arglist",
                        Some(form.pretty()),
                    );
                }
                _ => match symbol.ctype() {
                    Some(ctype) => {
                        note_ctype_keyword(ctype, symbol, span, mcx);
                        if let Some((_, ignored)) = pending.replace((ctype, symbol.clone())) {
                            mcx.warning(
                                WarnFlag::Macro,
                                Some(span),
                                format!("ctype keyword {} overridden by {}", ignored, symbol),
                                None,
                            );
                        }
                    }
                    None => mcx.error(
                        Some(span),
                        "unexpected argument in formal arglist",
                        Some(symbol.to_string()),
                    ),
                },
            }
            continue;
        }

        if rest == RestState::Bound {
            mcx.error(
                Some(span),
                format!("formal {} after the :rest binder", symbol),
                Some(form.pretty()),
            );
            pending = None;
            continue;
        }

        let mut ctype = pending.take().map_or(&CTYPE_VALUE, |(ctype, _)| ctype);
        if check_types && !ctype.formal_allowed {
            mcx.error(
                Some(span),
                format!("ctype {} is not usable for formal {}", ctype, symbol),
                None,
            );
            ctype = &CTYPE_VALUE;
        }

        let bound = if rest == RestState::Open {
            rest = RestState::Bound;
            list.push_rest(symbol.clone(), ctype).is_some()
        } else {
            list.push(symbol.clone(), ctype).is_some()
        };
        if !bound {
            mcx.error(
                Some(span),
                format!("duplicate formal {}", symbol),
                Some(form.pretty()),
            );
        }
    }

    if let Some((_, keyword)) = pending {
        mcx.warning(
            WarnFlag::Macro,
            Some(span),
            format!("ctype keyword {} at end of formal arglist declares nothing", keyword),
            None,
        );
    }
    list
}

fn note_ctype_keyword(ctype: &CType, keyword: &Symbol, span: Span, mcx: &ModuleContext) {
    if ctype.is_alt_keyword(keyword.name()) {
        mcx.warning(
            WarnFlag::Deprecated,
            Some(span),
            format!("deprecated ctype keyword {}", keyword),
            None,
        );
        mcx.inform(Some(span), format!("use {} instead", ctype.keyword), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ctype::{CTYPE_BASIC_BLOCK, CTYPE_LONG, CTYPE_VOID};
    use crate::diagnostics::CollectingSink;
    use crate::macros::ExpandOptions;
    use std::rc::Rc;

    fn mcx() -> (ModuleContext, Rc<CollectingSink>) {
        let sink = Rc::new(CollectingSink::new());
        let mcx = ModuleContext::with_sink("formals", ExpandOptions::default(), sink.clone());
        (mcx, sink)
    }

    fn arglist(tokens: &[&str]) -> Form {
        Form::list(tokens.iter().map(|t| Form::sym(t)).collect(), Span::new(0, 10))
    }

    #[test]
    fn absent_list_is_empty_fixed() {
        let (mcx, sink) = mcx();
        let list = bind_formals(None, true, &mcx);
        assert!(list.is_empty());
        assert!(!list.is_variadic());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn ctype_applies_to_next_symbol_only() {
        let (mcx, sink) = mcx();
        let list = bind_formals(Some(&arglist(&["a", ":long", "n", "m"])), true, &mcx);
        assert_eq!(list.len(), 3);
        assert!(std::ptr::eq(list.get_by_name("n").unwrap().ctype, &CTYPE_LONG));
        assert!(std::ptr::eq(list.get_by_name("m").unwrap().ctype, &CTYPE_VALUE));
        assert_eq!(list.get_by_name("m").unwrap().rank, 2);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn rest_binder_is_last() {
        let (mcx, _) = mcx();
        let list = bind_formals(Some(&arglist(&["a", "b", ":rest", "r"])), true, &mcx);
        assert!(list.is_variadic());
        assert!(list.has_rest_binder());
        assert_eq!(list.bindings.last().unwrap().binder, Symbol::intern("r"));
        assert_eq!(list.required(), 2);
    }

    #[test]
    fn second_rest_binder_is_an_error() {
        let (mcx, sink) = mcx();
        let list = bind_formals(Some(&arglist(&[":rest", "r", "s"])), true, &mcx);
        assert_eq!(list.len(), 1);
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn duplicates_and_auto_are_errors() {
        let (mcx, sink) = mcx();
        let list = bind_formals(Some(&arglist(&["a", ":auto", "a"])), true, &mcx);
        assert_eq!(list.len(), 1);
        assert_eq!(sink.error_count(), 2);
        assert!(sink.mentions("duplicate formal a"));
    }

    #[test]
    fn void_formal_checked_only_when_asked() {
        let (mcx, sink) = mcx();
        let checked = bind_formals(Some(&arglist(&[":void", "v"])), true, &mcx);
        assert_eq!(sink.error_count(), 1);
        assert!(std::ptr::eq(checked.bindings[0].ctype, &CTYPE_VALUE));

        let (mcx, sink) = self::mcx();
        let unchecked = bind_formals(Some(&arglist(&[":void", "v"])), false, &mcx);
        assert_eq!(sink.error_count(), 0);
        assert!(std::ptr::eq(unchecked.bindings[0].ctype, &CTYPE_VOID));
    }

    #[test]
    fn deprecated_keyword_warns_and_hints() {
        let (mcx, sink) = mcx();
        let list = bind_formals(Some(&arglist(&[":bb", "block"])), true, &mcx);
        assert!(std::ptr::eq(list.bindings[0].ctype, &CTYPE_BASIC_BLOCK));
        assert_eq!(sink.warning_count(), 1);
        assert!(sink.mentions("use :basic_block instead"));
    }

    #[test]
    fn non_symbols_and_dangling_keywords() {
        let (mcx, sink) = mcx();
        let form = Form::list(
            vec![Form::sym("a"), Form::Integer(3), Form::sym(":long")],
            Span::default(),
        );
        let list = bind_formals(Some(&form), true, &mcx);
        assert_eq!(list.len(), 1);
        assert!(sink.mentions("unexpected argument in formal arglist"));
        assert!(sink.mentions("declares nothing"));
    }
}
