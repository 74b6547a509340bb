//! The toplevel list driver.

use crate::ast::{Form, Span};
use crate::binding::Env;
use crate::diagnostics::{MexError, WarnFlag};
use crate::macros::source::Expansion;
use crate::macros::{Expander, ModuleContext};

/// Expands every toplevel form of a module in order, splicing multi-valued
/// results into the output list.
///
/// Problems in individual forms are reported and skipped. The only failure is
/// cancellation, which abandons the pass.
pub fn macroexpand_toplevel_list(
    forms: &[Form],
    env: &Env,
    expander: Option<&Expander>,
    mcx: &ModuleContext,
) -> Result<Vec<Expansion>, MexError> {
    let expander = expander.cloned().unwrap_or_else(Expander::standard);
    let mut last_span: Option<Span> = None;
    let mut expanded = Vec::with_capacity(forms.len());

    if forms.len() < 2 {
        mcx.warning(
            WarnFlag::Macro,
            forms.first().and_then(Form::span),
            format!("only {} toplevel form(s) to expand", forms.len()),
            None,
        );
    }

    for form in forms {
        if mcx.is_cancelled() {
            return Err(MexError::Interrupted);
        }
        if let Some(span) = form.span() {
            last_span = Some(span);
        }
        match expander.expand(form, env, mcx) {
            Some(expansion) => splice(expansion, &mut expanded),
            None if mcx.is_cancelled() => return Err(MexError::Interrupted),
            None => mcx.warning(
                WarnFlag::Macro,
                last_span,
                "null expansion for a toplevel form",
                Some(form.pretty()),
            ),
        }
    }

    if expanded.len() < forms.len() {
        mcx.warning(
            WarnFlag::Macro,
            last_span,
            format!(
                "toplevel expansion shrank from {} forms to {} results",
                forms.len(),
                expanded.len()
            ),
            None,
        );
    }
    if expanded.len() < 2 {
        mcx.warning(
            WarnFlag::Macro,
            last_span,
            format!("toplevel expansion produced only {} result(s)", expanded.len()),
            None,
        );
    }
    Ok(expanded)
}

/// Forces every deferred node at the top of `expansions`. Nodes whose operator
/// is still unbound are reported and dropped.
pub fn resolve_deferred(expansions: &[Expansion]) -> Vec<Expansion> {
    let mut resolved = Vec::with_capacity(expansions.len());
    for expansion in expansions {
        match expansion.as_deferred() {
            Some(deferred) => {
                if let Some(forced) = deferred.force() {
                    splice(forced, &mut resolved);
                }
            }
            None => splice(expansion.clone(), &mut resolved),
        }
    }
    resolved
}

fn splice(expansion: Expansion, into: &mut Vec<Expansion>) {
    match expansion {
        Expansion::Many(items) => {
            for item in items {
                splice(item, into);
            }
        }
        single => into.push(single),
    }
}
