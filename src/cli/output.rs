//! Handles all user-facing output for the CLI.
//!
//! Results go to stdout, colorized with `termcolor` when the terminal allows
//! it. Diagnostics go to stderr through miette's report handler.

use crate::ast::Symbol;
use crate::binding::{Binding, Env};
use crate::diagnostics::ExpansionDiagnostic;
use crate::macros::{Expansion, ExpansionStep};
use crate::patterns::{Pattern, WeightSummary};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Prints one line per expansion, numbered.
pub fn print_expansions(expansions: &[Expansion]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for (i, expansion) in expansions.iter().enumerate() {
        write_index(&mut stdout, i);
        let _ = writeln!(stdout, "{}", expansion.pretty());
    }
}

/// Prints the recorded dispatches, indented by nesting depth.
pub fn print_trace(trace: &[ExpansionStep]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
    let _ = writeln!(stdout, "--- trace: {} steps ---", trace.len());
    let _ = stdout.reset();
    for step in trace {
        let indent = "  ".repeat(step.depth.saturating_sub(1));
        let _ = writeln!(
            stdout,
            "{}{} [{}] @{}..{}",
            indent, step.operator, step.kind, step.span.start, step.span.end
        );
    }
}

/// Prints each compiled pattern with its weight and variables, then the
/// weight summary.
pub fn print_patterns(patterns: &[(Pattern, Vec<Symbol>)], summary: &WeightSummary) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for (i, (pattern, variables)) in patterns.iter().enumerate() {
        write_index(&mut stdout, i);
        let _ = write!(stdout, "{} ", pattern);
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = write!(stdout, "#w{}", pattern.weight());
        let _ = stdout.reset();
        if !variables.is_empty() {
            let names: Vec<&str> = variables.iter().map(Symbol::name).collect();
            let _ = write!(stdout, " vars: {}", names.join(" "));
        }
        let _ = writeln!(stdout);
    }
    let _ = stdout.set_color(ColorSpec::new().set_bold(true));
    let _ = writeln!(
        stdout,
        "weights: max {} min {} sum {}",
        summary.max, summary.min, summary.sum
    );
    let _ = stdout.reset();
}

/// Prints every scope from `env` outward, names sorted within a scope.
pub fn print_bindings(env: &Env) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut scope = Some(env);
    while let Some(current) = scope {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "scope {} ({} bindings)", current.depth(), current.len());
        let _ = stdout.reset();

        let mut entries: Vec<Binding> = current.bindings().values().cloned().collect();
        entries.sort_by(|a, b| a.binder().name().cmp(b.binder().name()));
        for binding in entries {
            let _ = writeln!(stdout, "  {:<24} {}", binding.binder().name(), binding.kind());
        }
        scope = current.parent();
    }
}

pub fn print_diagnostics(diagnostics: &[ExpansionDiagnostic]) {
    for diagnostic in diagnostics {
        let report = miette::Report::new(diagnostic.clone());
        eprintln!("{report:?}");
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_index(stdout: &mut StandardStream, i: usize) {
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = write!(stdout, "[{}] ", i);
    let _ = stdout.reset();
}
