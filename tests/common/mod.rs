//! Shared builders for the integration tests.
//!
//! Forms are written as JSON form documents, the same format the CLI reads:
//! arrays are lists, strings are symbols, `{"str": ..}` is a string literal.
#![allow(dead_code)]

use mexpand::ast::json::read_forms;
use mexpand::ast::Form;
use mexpand::binding::{Binding, CIterator, CMatcher, Env, FormalList, FunMatcher, Hook};
use mexpand::macros::{initial_env, macroexpand_1, ExpandOptions, Expansion, ModuleContext, Source};
use mexpand::CollectingSink;
use std::rc::Rc;

/// Parses a document of several forms.
pub fn forms(json: &str) -> Vec<Form> {
    read_forms(json).expect("test document should parse")
}

/// Parses a single form, e.g. `form(r#"["f", 1]"#)`.
pub fn form(json: &str) -> Form {
    let mut all = forms(&format!("[{}]", json));
    assert_eq!(all.len(), 1, "expected exactly one form");
    all.remove(0)
}

/// A module environment under the initial environment, with its context and sink.
pub struct Fixture {
    pub env: Env,
    pub mcx: ModuleContext,
    pub sink: Rc<CollectingSink>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_options(ExpandOptions::default())
    }

    pub fn with_options(options: ExpandOptions) -> Self {
        let sink = Rc::new(CollectingSink::new());
        let mcx = ModuleContext::with_sink("test-module", options, sink.clone());
        Fixture {
            env: initial_env().extend(),
            mcx,
            sink,
        }
    }

    pub fn install(&self, binding: Binding) -> &Self {
        self.env.install(binding);
        self
    }

    pub fn expand(&self, json: &str) -> Option<Expansion> {
        macroexpand_1(&form(json), &self.env, None, &self.mcx)
    }

    /// Expands and returns the source node, failing the test otherwise.
    pub fn expand_node(&self, json: &str) -> Rc<Source> {
        match self.expand(json) {
            Some(Expansion::Node(node)) => node,
            other => panic!("expected a source node for {}, got {:?}", json, other),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sink
            .diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }
}

/// `(each_in_range (lo hi) (i) body...)`.
pub fn range_citerator() -> Binding {
    Binding::citerator(CIterator::new(
        "each_in_range",
        FormalList::fixed(&["lo", "hi"]),
        FormalList::fixed(&["i"]),
    ))
}

/// `(? (pair_of tag left right))`: one input, two outputs.
pub fn pair_matcher() -> Binding {
    Binding::cmatcher(CMatcher::new(
        "pair_of",
        FormalList::fixed(&["tag"]),
        FormalList::fixed(&["left", "right"]),
    ))
}

/// `(? (some_value v))`: no input, one output.
pub fn some_funmatcher() -> Binding {
    Binding::funmatcher(
        FunMatcher::new("some_value", FormalList::default(), FormalList::fixed(&["v"])),
        None,
    )
}

pub fn notify_hook() -> Binding {
    Binding::hook(Hook::new(
        "notify",
        FormalList::fixed(&["what", "how"]),
        FormalList::default(),
    ))
}

pub fn literal(expansion: &Expansion) -> &Form {
    expansion
        .as_literal()
        .unwrap_or_else(|| panic!("expected a literal, got {:?}", expansion))
}

/// The literal in one tuple slot; fails on an empty slot.
pub fn literal_slot(slot: &Option<Expansion>) -> &Form {
    literal(slot.as_ref().expect("tuple slot should be filled"))
}
