//! The mexpand command-line interface.
//!
//! Every command builds a module environment beneath the thread's initial
//! environment, installs the optional prelude into it, and reports the
//! collected diagnostics on stderr. The exit status is 1 when any error
//! diagnostic was reported and 2 when the command itself failed.

use crate::ast::json::read_forms;
use crate::ast::Form;
use crate::binding::Env;
use crate::config::ExpansionConfig;
use crate::diagnostics::CollectingSink;
use crate::macros::{
    initial_env, macroexpand_toplevel_list, resolve_deferred, ExpandOptions, Expander,
    ModuleContext,
};
use crate::patterns::{pattern_weight_tuple, patternexpand_1, PatternContext};
use crate::MexError;
use args::{Command, MexpandArgs};
use clap::Parser;
use std::fs;
use std::path::Path;
use std::process;
use std::rc::Rc;

pub mod args;
pub mod output;

/// Flags of the `expand` command that override prelude options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandFlags {
    pub bootstrap: bool,
    pub warn_shadow: bool,
    pub trace: bool,
    pub resolve: bool,
}

/// The main entry point for the CLI.
pub fn run() {
    let args = MexpandArgs::parse();

    let result = match args.command {
        Command::Expand {
            file,
            config,
            bootstrap,
            warn_shadow,
            trace,
            resolve,
        } => handle_expand(
            &file,
            config.as_deref(),
            ExpandFlags {
                bootstrap,
                warn_shadow,
                trace,
                resolve,
            },
        ),
        Command::Patterns { file, config } => handle_patterns(&file, config.as_deref()),
        Command::Bindings { config } => handle_bindings(config.as_deref()),
    };

    match result {
        Ok(false) => {}
        Ok(true) => process::exit(1),
        Err(e) => {
            let report = miette::Report::new(e);
            eprintln!("{report:?}");
            process::exit(2);
        }
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Handles the `expand` subcommand. Returns whether errors were reported.
fn handle_expand(file: &Path, config: Option<&Path>, flags: ExpandFlags) -> Result<bool, MexError> {
    let config = load_config(config)?;
    let mut options = config.options.clone();
    options.bootstrap |= flags.bootstrap;
    options.warn_shadow |= flags.warn_shadow;
    options.trace |= flags.trace;

    let session = Session::open(&config, file, options)?;
    let forms = read_document(file)?;
    let mut expansions = macroexpand_toplevel_list(&forms, &session.env, None, &session.mcx)?;
    if flags.resolve {
        expansions = resolve_deferred(&expansions);
    }

    output::print_expansions(&expansions);
    if flags.trace {
        output::print_trace(&session.mcx.trace());
    }
    Ok(session.finish())
}

/// Handles the `patterns` subcommand.
fn handle_patterns(file: &Path, config: Option<&Path>) -> Result<bool, MexError> {
    let config = load_config(config)?;
    let session = Session::open(&config, file, config.options.clone())?;
    let forms = read_document(file)?;

    let expander = Expander::standard();
    let mut compiled = Vec::with_capacity(forms.len());
    for form in &forms {
        let mut pctx = PatternContext::new(expander.clone(), session.mcx.clone());
        let span = form.span().unwrap_or_default();
        if let Some(pattern) = patternexpand_1(form, &session.env, &mut pctx, span) {
            let variables: Vec<_> = pctx.variables().iter().map(|v| v.symbol.clone()).collect();
            compiled.push((pattern, variables));
        }
    }
    let patterns: Vec<_> = compiled.iter().map(|(p, _)| p.clone()).collect();
    output::print_patterns(&compiled, &pattern_weight_tuple(&patterns));
    Ok(session.finish())
}

/// Handles the `bindings` subcommand.
fn handle_bindings(config: Option<&Path>) -> Result<bool, MexError> {
    let config = load_config(config)?;
    let session = Session::open(&config, Path::new("bindings"), config.options.clone())?;
    output::print_bindings(&session.env);
    Ok(session.finish())
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// One module being processed: its environment, context and sink.
struct Session {
    env: Env,
    mcx: ModuleContext,
    sink: Rc<CollectingSink>,
}

impl Session {
    fn open(config: &ExpansionConfig, file: &Path, options: ExpandOptions) -> Result<Self, MexError> {
        let stem = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("module");
        let sink = Rc::new(CollectingSink::new());
        let mcx = ModuleContext::with_sink(config.module_name(stem), options, sink.clone());
        let env = initial_env().extend();
        config.install(&env, &mcx)?;
        Ok(Session { env, mcx, sink })
    }

    /// Prints the diagnostics and reports whether any of them was an error.
    fn finish(self) -> bool {
        let failed = self.sink.error_count() > 0 || self.mcx.is_cancelled();
        output::print_diagnostics(&self.sink.take());
        failed
    }
}

fn load_config(path: Option<&Path>) -> Result<ExpansionConfig, MexError> {
    match path {
        Some(path) => ExpansionConfig::load(path),
        None => Ok(ExpansionConfig::default()),
    }
}

fn read_document(path: &Path) -> Result<Vec<Form>, MexError> {
    let text = fs::read_to_string(path).map_err(|source| MexError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_forms(&text)
}
