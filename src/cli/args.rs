//! Defines the command-line arguments and subcommands for the mexpand CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "mexpand",
    version,
    about = "Expand symbolic form documents against a binding prelude."
)]
pub struct MexpandArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Expand every toplevel form of a form document.
    Expand {
        /// The JSON form document to expand.
        #[arg(required = true)]
        file: PathBuf,
        /// Prelude declaring selectors, primitives, matchers... (YAML or JSON).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Apply unbound operators instead of deferring them.
        #[arg(long)]
        bootstrap: bool,
        /// Warn when a binding hides an outer one.
        #[arg(long)]
        warn_shadow: bool,
        /// Print every dispatch on a bound operator.
        #[arg(long)]
        trace: bool,
        /// Force deferred expansions once the whole document is expanded.
        #[arg(long)]
        resolve: bool,
    },
    /// Compile each form of a document as the pattern of one match clause.
    Patterns {
        /// The JSON form document holding the patterns.
        #[arg(required = true)]
        file: PathBuf,
        /// Prelude declaring the matchers the patterns use.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the bindings visible to a module.
    Bindings {
        /// Prelude whose declarations are listed with the standard macros.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
