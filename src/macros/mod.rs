//! # Macro expansion
//!
//! This module rewrites located symbolic forms into [`Source`] nodes for the
//! code generator. The operator of each compound form is resolved in the
//! lexical [`Env`](crate::binding::Env) and the form is dispatched on the
//! kind of binding found: macros run their expander, selectors become message
//! sends, primitives, hooks, citerators, matchers and fields get their own
//! node shapes, and anything else is an application.
//!
//! ## Core Principles
//!
//! - **Never unwind**: malformed forms are reported through the module
//!   context's diagnostic sink and expand to nothing (or to a best-effort node)
//!   so sibling forms keep expanding. Only cancellation aborts a pass.
//! - **Forward references are data**: an operator that is not bound yet
//!   produces a [`Deferred`] node that can be forced once it is.
//! - **Pluggable recursion**: every recursive call goes through the active
//!   [`Expander`], so a caller can interpose on sub-form expansion.
//!
//! ## Module Structure
//!
//! - **`context`**: module context, options, cancellation and trace
//! - **`expander`**: the single-form dispatcher
//! - **`formals`**: the formal argument list binder
//! - **`install`**: the initial environment and the install entry points
//! - **`source`**: source nodes and deferred expansions
//! - **`std`**: `progn`, `quote`, `let` and `match`
//! - **`toplevel`**: the toplevel list driver

pub mod context;
pub mod expander;
pub mod formals;
pub mod install;
pub mod source;
pub mod std;
pub mod toplevel;

pub use context::{
    CancelToken, DepthGuard, ExpandOptions, ExpansionStep, ModuleContext,
    DEFAULT_MAX_EXPANSION_DEPTH,
};
pub use expander::{expand_body, expand_operand, expand_restlist_as_tuple, macroexpand_1};
pub use formals::bind_formals;
pub use install::{initial_env, install_macro, install_patmacro, primordial_env};
pub use source::{Deferred, Expansion, ExpansionTuple, MatchClause, Source};
pub use toplevel::{macroexpand_toplevel_list, resolve_deferred};

use crate::ast::{Form, Sexpr};
use crate::binding::Env;
use ::std::fmt;
use ::std::rc::Rc;
use ::std::sync::Arc;

// ============================================================================
// EXPANDER CLOSURES
// ============================================================================

pub type ExpandFn = dyn Fn(&Form, &Env, &Expander, &ModuleContext) -> Option<Expansion>;

/// The expander in charge of recursive sub-form expansion.
///
/// It receives itself as an argument, so a wrapping expander stays in charge
/// all the way down.
#[derive(Clone)]
pub struct Expander(Rc<ExpandFn>);

impl Expander {
    /// Plain [`macroexpand_1`].
    pub fn standard() -> Self {
        Expander::new(|form, env, this, mcx| macroexpand_1(form, env, Some(this), mcx))
    }

    pub fn new(
        f: impl Fn(&Form, &Env, &Expander, &ModuleContext) -> Option<Expansion> + 'static,
    ) -> Self {
        Expander(Rc::new(f))
    }

    pub fn expand(&self, form: &Form, env: &Env, mcx: &ModuleContext) -> Option<Expansion> {
        (self.0)(form, env, self, mcx)
    }
}

impl fmt::Debug for Expander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Expander(..)")
    }
}

pub type MacroExpandFn =
    dyn Fn(&Arc<Sexpr>, &Env, &Expander, &ModuleContext) -> Option<Expansion>;

/// The expression-side closure of a macro or pattern macro.
#[derive(Clone)]
pub struct MacroExpander(Rc<MacroExpandFn>);

impl MacroExpander {
    pub fn new(
        f: impl Fn(&Arc<Sexpr>, &Env, &Expander, &ModuleContext) -> Option<Expansion> + 'static,
    ) -> Self {
        MacroExpander(Rc::new(f))
    }

    pub fn call(
        &self,
        form: &Arc<Sexpr>,
        env: &Env,
        expander: &Expander,
        mcx: &ModuleContext,
    ) -> Option<Expansion> {
        (self.0)(form, env, expander, mcx)
    }
}

impl fmt::Debug for MacroExpander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MacroExpander(..)")
    }
}
