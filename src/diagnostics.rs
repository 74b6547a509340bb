//! # Diagnostics
//!
//! Two kinds of failure exist in the expander, and they are kept apart:
//!
//! - **Expansion diagnostics** ([`ExpansionDiagnostic`]) are reported while a form
//!   is being expanded. They never unwind: the dispatcher records the problem
//!   through a [`DiagnosticSink`] and yields a null or best-effort result so the
//!   rest of the translation unit is still processed.
//! - **Hard errors** ([`MexError`]) abort a whole pass: cooperative cancellation,
//!   unreadable input documents, invalid configuration.
//!
//! Both implement [`miette::Diagnostic`] so the CLI renders them the same way.
//!
//! Use `err_msg!` for message-only hard errors:
//!
//! ```rust
//! use mexpand::err_msg;
//! let err = err_msg!(Config, "unknown ctype keyword {}", ":float");
//! assert!(matches!(err, mexpand::MexError::Config { .. }));
//! ```

use crate::ast::Span;
use miette::{Diagnostic, LabeledSpan, Severity as MietteSeverity};
use std::cell::RefCell;
use std::fmt;
use thiserror::Error;

// ============================================================================
// HARD ERRORS
// ============================================================================

/// Pass-aborting failures.
#[derive(Debug, Error, Diagnostic)]
pub enum MexError {
    #[error("expansion interrupted")]
    #[diagnostic(
        code(mexpand::interrupted),
        help("the enclosing driver requested cancellation")
    )]
    Interrupted,

    #[error("cannot read {path}: {source}")]
    #[diagnostic(code(mexpand::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed form document: {message}")]
    #[diagnostic(code(mexpand::document))]
    Document { message: String },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(mexpand::config))]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(code(mexpand::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(mexpand::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

/// Constructs a message-carrying [`MexError`] variant with a formatted message.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $msg:literal, $($arg:expr),+ $(,)?) => {
        $crate::MexError::$variant {
            message: format!($msg, $($arg),+),
        }
    };
    ($variant:ident, $msg:expr) => {
        $crate::MexError::$variant {
            message: format!("{}", $msg),
        }
    };
}

// ============================================================================
// EXPANSION DIAGNOSTICS
// ============================================================================

/// Warning classes; each warning carries the flag that would silence it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarnFlag {
    /// A new binding hides one visible from an enclosing scope.
    Shadow,
    /// Heuristic warnings about macro usage and suspicious expansions.
    Macro,
    /// Deprecated spellings.
    Deprecated,
    /// Leniencies applied while bootstrapping the initial environment.
    Bootstrap,
}

impl WarnFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarnFlag::Shadow => "shadow",
            WarnFlag::Macro => "macro",
            WarnFlag::Deprecated => "deprecated",
            WarnFlag::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for WarnFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning(WarnFlag),
    Inform,
}

/// One reported problem or hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionDiagnostic {
    pub severity: Severity,
    pub span: Option<Span>,
    pub message: String,
    /// Printed form of the offending object, when there is one.
    pub subject: Option<String>,
}

impl ExpansionDiagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.severity, Severity::Warning(_))
    }
}

impl fmt::Display for ExpansionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message)?,
            Severity::Warning(flag) => write!(f, "warning [-W{}]: {}", flag, self.message)?,
            Severity::Inform => write!(f, "note: {}", self.message)?,
        }
        if let Some(subject) = &self.subject {
            write!(f, " [{}]", subject)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExpansionDiagnostic {}

impl Diagnostic for ExpansionDiagnostic {
    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.severity {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning(_) => MietteSeverity::Warning,
            Severity::Inform => MietteSeverity::Advice,
        })
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self.severity {
            Severity::Warning(flag) => Some(Box::new(format!("mexpand::W{}", flag))),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message.clone()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Receiver of expansion diagnostics.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: ExpansionDiagnostic);
}

/// Sink that keeps every diagnostic in emission order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    diagnostics: RefCell<Vec<ExpansionDiagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything collected so far.
    pub fn diagnostics(&self) -> Vec<ExpansionDiagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn take(&self) -> Vec<ExpansionDiagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.borrow().iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.is_warning())
            .count()
    }

    /// True if any diagnostic's message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.message.contains(needle))
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: ExpansionDiagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

#[cfg(test)]
mod diagnostics_tests {
    use super::*;
    use miette::Report;

    fn sample(severity: Severity) -> ExpansionDiagnostic {
        ExpansionDiagnostic {
            severity,
            span: Some(Span { start: 2, end: 7 }),
            message: "missing receiver expression".to_string(),
            subject: Some("(send)".to_string()),
        }
    }

    #[test]
    fn display_includes_flag_and_subject() {
        let warning = sample(Severity::Warning(WarnFlag::Shadow));
        assert_eq!(
            warning.to_string(),
            "warning [-Wshadow]: missing receiver expression [(send)]"
        );
        assert!(sample(Severity::Error).to_string().starts_with("error:"));
    }

    #[test]
    fn miette_report_renders_message() {
        let report = Report::new(sample(Severity::Error));
        let output = format!("{report:?}");
        assert!(output.contains("missing receiver expression"));
    }

    #[test]
    fn collecting_sink_counts_by_severity() {
        let sink = CollectingSink::new();
        sink.emit(sample(Severity::Error));
        sink.emit(sample(Severity::Warning(WarnFlag::Macro)));
        sink.emit(sample(Severity::Inform));
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
        assert!(sink.mentions("receiver"));
        assert_eq!(sink.take().len(), 3);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn err_msg_formats_arguments() {
        let err = crate::err_msg!(Document, "bad node at {}", 3);
        assert_eq!(err.to_string(), "malformed form document: bad node at 3");
    }
}
