//! # mexpand
//!
//! The macro and pattern expansion core of an embeddable extension language
//! for compiler plugins. Already-parsed symbolic forms go in; source nodes for
//! a code generator come out, with pattern forms compiled into weighted
//! pattern trees along the way.
//!
//! - [`ast`]: forms, symbols and ctypes
//! - [`binding`]: bindings, descriptors and environments
//! - [`macros`]: the dispatcher, the toplevel driver and the standard macros
//! - [`patterns`]: the pattern compiler
//! - [`config`]: prelude files
//! - [`diagnostics`]: expansion diagnostics and hard errors

pub use crate::diagnostics::{
    CollectingSink, DiagnosticSink, ExpansionDiagnostic, MexError, Severity, WarnFlag,
};

pub mod ast;
pub mod binding;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod macros;
pub mod patterns;
