//! The initial environment and the two ways to add macros to it.
//!
//! Each thread owns a primordial scope holding the standard macros and an
//! initial environment directly beneath it. Module environments are children
//! of the initial one, so definitions installed there are visible to every
//! module expanded afterwards on the same thread.

use crate::ast::Symbol;
use crate::binding::{Binding, Env, MacroBinding, PatMacroBinding};
use crate::diagnostics::WarnFlag;
use crate::macros::std::install_std_macros;
use crate::macros::{MacroExpander, ModuleContext};
use crate::patterns::PatternExpander;

thread_local! {
    static PRIMORDIAL_ENV: Env = {
        let env = Env::root();
        install_std_macros(&env);
        env
    };
    static INITIAL_ENV: Env = PRIMORDIAL_ENV.with(Env::extend);
}

/// The scope holding the standard macros.
pub fn primordial_env() -> Env {
    PRIMORDIAL_ENV.with(Env::clone)
}

/// The environment every module environment descends from.
pub fn initial_env() -> Env {
    INITIAL_ENV.with(Env::clone)
}

/// Binds `symbol` to a macro in the initial environment.
pub fn install_macro(symbol: &Symbol, expander: MacroExpander, mcx: &ModuleContext) {
    let env = initial_env();
    check_shadow(&env, symbol, mcx);
    env.install(Binding::Macro(MacroBinding {
        binder: symbol.clone(),
        expander,
    }));
}

/// Binds `symbol` to a pattern macro in the initial environment.
pub fn install_patmacro(
    symbol: &Symbol,
    pattern_expander: PatternExpander,
    macro_expander: MacroExpander,
    mcx: &ModuleContext,
) {
    let env = initial_env();
    check_shadow(&env, symbol, mcx);
    env.install(Binding::PatMacro(PatMacroBinding {
        binder: symbol.clone(),
        macro_expander,
        pattern_expander,
    }));
}

fn check_shadow(env: &Env, symbol: &Symbol, mcx: &ModuleContext) {
    if !mcx.options().warn_shadow {
        return;
    }
    if let Some(hidden) = env.lookup_outer(symbol) {
        mcx.warning(
            WarnFlag::Shadow,
            None,
            format!("installing {} shadows an outer {} binding", symbol, hidden.kind()),
            Some(symbol.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::macros::{ExpandOptions, Expansion};
    use std::rc::Rc;

    fn noop() -> MacroExpander {
        MacroExpander::new(|_, _, _, _| None)
    }

    fn context(warn_shadow: bool) -> (ModuleContext, Rc<CollectingSink>) {
        let sink = Rc::new(CollectingSink::new());
        let options = ExpandOptions {
            warn_shadow,
            ..Default::default()
        };
        (ModuleContext::with_sink("install", options, sink.clone()), sink)
    }

    #[test]
    fn initial_env_sits_under_the_standard_macros() {
        let initial = initial_env();
        assert!(initial.parent().unwrap().ptr_eq(&primordial_env()));
        assert!(initial.is_bound(&Symbol::intern("progn")));
        assert!(initial.lookup_local(&Symbol::intern("progn")).is_none());
    }

    #[test]
    fn shadowing_a_standard_macro_warns_when_enabled() {
        let (mcx, sink) = context(true);
        install_macro(&Symbol::intern("quote"), noop(), &mcx);
        assert_eq!(sink.warning_count(), 1);
        assert!(sink.mentions("shadows an outer macro binding"));
    }

    #[test]
    fn shadow_check_is_off_by_default() {
        let (mcx, sink) = context(false);
        install_macro(&Symbol::intern("progn"), noop(), &mcx);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn fresh_names_install_silently() {
        let (mcx, sink) = context(true);
        let name = Symbol::intern("install-fresh");
        install_patmacro(
            &name,
            PatternExpander::new(|_, _, _| None),
            MacroExpander::new(|_, _, _, _| Some(Expansion::Many(vec![]))),
            &mcx,
        );
        assert!(sink.diagnostics().is_empty());
        assert!(initial_env().lookup_local(&name).is_some());
    }
}
