//! The module context threaded through every expansion.
//!
//! A [`ModuleContext`] is a cheap handle: deferred expansions capture it and
//! report into the same sink later. It owns the expansion options, the
//! diagnostic sink, the cancellation token, the nesting-depth counter and the
//! optional expansion trace.

use crate::ast::{Span, Symbol};
use crate::binding::BindingKind;
use crate::diagnostics::{CollectingSink, DiagnosticSink, ExpansionDiagnostic, Severity, WarnFlag};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default nesting limit for a single expansion.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 512;

/// Knobs for one expansion pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpandOptions {
    /// Expanding the initial environment itself: unbound operators become
    /// plain applications (with a warning) instead of deferred expansions.
    pub bootstrap: bool,
    /// Warn when an installed macro hides an outer binding.
    pub warn_shadow: bool,
    /// Validate declared ctypes while binding formal lists.
    pub check_formal_types: bool,
    /// Record every dispatch on a bound operator.
    pub trace: bool,
    pub max_depth: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        ExpandOptions {
            bootstrap: false,
            warn_shadow: false,
            check_formal_types: true,
            trace: false,
            max_depth: DEFAULT_MAX_EXPANSION_DEPTH,
        }
    }
}

/// Shared flag the enclosing driver sets to interrupt a runaway expansion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One recorded dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionStep {
    pub operator: Symbol,
    pub kind: BindingKind,
    pub span: Span,
    pub depth: usize,
}

struct ModuleState {
    name: String,
    options: ExpandOptions,
    sink: Rc<dyn DiagnosticSink>,
    cancel: CancelToken,
    depth: Cell<usize>,
    trace: RefCell<Vec<ExpansionStep>>,
}

#[derive(Clone)]
pub struct ModuleContext(Rc<ModuleState>);

/// Keeps the nesting counter raised while alive.
pub struct DepthGuard {
    module: ModuleContext,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let depth = &self.module.0.depth;
        depth.set(depth.get().saturating_sub(1));
    }
}

impl ModuleContext {
    /// A context reporting into its own fresh [`CollectingSink`].
    pub fn new(name: &str, options: ExpandOptions) -> Self {
        Self::with_sink(name, options, Rc::new(CollectingSink::new()))
    }

    pub fn with_sink(name: &str, options: ExpandOptions, sink: Rc<dyn DiagnosticSink>) -> Self {
        ModuleContext(Rc::new(ModuleState {
            name: name.to_string(),
            options,
            sink,
            cancel: CancelToken::new(),
            depth: Cell::new(0),
            trace: RefCell::new(Vec::new()),
        }))
    }

    /// Same context, polling `cancel` instead of its own token.
    pub fn with_cancel_token(self, cancel: CancelToken) -> Self {
        let state = match Rc::try_unwrap(self.0) {
            Ok(state) => state,
            Err(shared) => ModuleState {
                name: shared.name.clone(),
                options: shared.options.clone(),
                sink: Rc::clone(&shared.sink),
                cancel: shared.cancel.clone(),
                depth: Cell::new(shared.depth.get()),
                trace: RefCell::new(shared.trace.borrow().clone()),
            },
        };
        ModuleContext(Rc::new(ModuleState { cancel, ..state }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.0.options
    }

    pub fn is_bootstrapping(&self) -> bool {
        self.0.options.bootstrap
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.0.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.cancel.is_cancelled()
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    fn emit(&self, severity: Severity, span: Option<Span>, message: String, subject: Option<String>) {
        self.0.sink.emit(ExpansionDiagnostic {
            severity,
            span,
            message,
            subject,
        });
    }

    pub fn error(&self, span: Option<Span>, message: impl Into<String>, subject: Option<String>) {
        self.emit(Severity::Error, span, message.into(), subject);
    }

    pub fn warning(
        &self,
        flag: WarnFlag,
        span: Option<Span>,
        message: impl Into<String>,
        subject: Option<String>,
    ) {
        self.emit(Severity::Warning(flag), span, message.into(), subject);
    }

    pub fn inform(&self, span: Option<Span>, message: impl Into<String>, subject: Option<String>) {
        self.emit(Severity::Inform, span, message.into(), subject);
    }

    // ------------------------------------------------------------------------
    // Depth and trace
    // ------------------------------------------------------------------------

    /// Enters one nesting level, or reports and returns `None` past the limit.
    pub fn enter(&self, span: Span) -> Option<DepthGuard> {
        let depth = self.0.depth.get();
        if depth >= self.0.options.max_depth {
            self.error(
                Some(span),
                format!("expansion nesting too deep (limit {})", self.0.options.max_depth),
                None,
            );
            return None;
        }
        self.0.depth.set(depth + 1);
        Some(DepthGuard {
            module: self.clone(),
        })
    }

    pub fn depth(&self) -> usize {
        self.0.depth.get()
    }

    pub fn record_step(&self, operator: &Symbol, kind: BindingKind, span: Span) {
        if !self.0.options.trace {
            return;
        }
        self.0.trace.borrow_mut().push(ExpansionStep {
            operator: operator.clone(),
            kind,
            span,
            depth: self.depth(),
        });
    }

    pub fn trace(&self) -> Vec<ExpansionStep> {
        self.0.trace.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &ModuleContext) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("name", &self.0.name)
            .field("options", &self.0.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_sink(options: ExpandOptions) -> (ModuleContext, Rc<CollectingSink>) {
        let sink = Rc::new(CollectingSink::new());
        let mcx = ModuleContext::with_sink("test", options, sink.clone());
        (mcx, sink)
    }

    #[test]
    fn depth_guard_unwinds() {
        let (mcx, _) = context_with_sink(ExpandOptions::default());
        {
            let _outer = mcx.enter(Span::default()).unwrap();
            let _inner = mcx.enter(Span::default()).unwrap();
            assert_eq!(mcx.depth(), 2);
        }
        assert_eq!(mcx.depth(), 0);
    }

    #[test]
    fn depth_limit_reports_error() {
        let options = ExpandOptions {
            max_depth: 1,
            ..Default::default()
        };
        let (mcx, sink) = context_with_sink(options);
        let _first = mcx.enter(Span::default()).unwrap();
        assert!(mcx.enter(Span::new(3, 4)).is_none());
        assert!(sink.mentions("nesting too deep"));
    }

    #[test]
    fn trace_only_when_enabled() {
        let (quiet, _) = context_with_sink(ExpandOptions::default());
        quiet.record_step(&Symbol::intern("m"), BindingKind::Macro, Span::default());
        assert!(quiet.trace().is_empty());

        let (loud, _) = context_with_sink(ExpandOptions {
            trace: true,
            ..Default::default()
        });
        loud.record_step(&Symbol::intern("m"), BindingKind::Macro, Span::default());
        assert_eq!(loud.trace().len(), 1);
    }

    #[test]
    fn external_cancel_token_is_polled() {
        let token = CancelToken::new();
        let mcx = ModuleContext::new("test", ExpandOptions::default()).with_cancel_token(token.clone());
        assert!(!mcx.is_cancelled());
        token.cancel();
        assert!(mcx.is_cancelled());
    }
}
