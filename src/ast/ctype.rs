//! Declared types ("ctypes") for formals, primitives and hooks.
//!
//! A ctype is named in source by its keyword (`:long`, `:tree`, ...). Some
//! ctypes also answer to an older alternate keyword that is still accepted but
//! reported as deprecated.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub struct CType {
    /// Short name, e.g. `long`.
    pub name: &'static str,
    /// Preferred keyword spelling, e.g. `:long`.
    pub keyword: &'static str,
    /// Deprecated alternate spelling, if any.
    pub alt_keyword: Option<&'static str>,
    /// Whether a formal argument may be declared with this type.
    pub formal_allowed: bool,
}

pub static CTYPE_VALUE: CType = CType {
    name: "value",
    keyword: ":value",
    alt_keyword: None,
    formal_allowed: true,
};

pub static CTYPE_LONG: CType = CType {
    name: "long",
    keyword: ":long",
    alt_keyword: None,
    formal_allowed: true,
};

pub static CTYPE_CSTRING: CType = CType {
    name: "cstring",
    keyword: ":cstring",
    alt_keyword: None,
    formal_allowed: true,
};

pub static CTYPE_TREE: CType = CType {
    name: "tree",
    keyword: ":tree",
    alt_keyword: None,
    formal_allowed: true,
};

pub static CTYPE_GIMPLE: CType = CType {
    name: "gimple",
    keyword: ":gimple",
    alt_keyword: None,
    formal_allowed: true,
};

pub static CTYPE_GIMPLE_SEQ: CType = CType {
    name: "gimple_seq",
    keyword: ":gimple_seq",
    alt_keyword: Some(":gimpleseq"),
    formal_allowed: true,
};

pub static CTYPE_BASIC_BLOCK: CType = CType {
    name: "basic_block",
    keyword: ":basic_block",
    alt_keyword: Some(":bb"),
    formal_allowed: true,
};

pub static CTYPE_EDGE: CType = CType {
    name: "edge",
    keyword: ":edge",
    alt_keyword: None,
    formal_allowed: true,
};

pub static CTYPE_VOID: CType = CType {
    name: "void",
    keyword: ":void",
    alt_keyword: None,
    formal_allowed: false,
};

pub static BUILTIN_CTYPES: &[&CType] = &[
    &CTYPE_VALUE,
    &CTYPE_LONG,
    &CTYPE_CSTRING,
    &CTYPE_TREE,
    &CTYPE_GIMPLE,
    &CTYPE_GIMPLE_SEQ,
    &CTYPE_BASIC_BLOCK,
    &CTYPE_EDGE,
    &CTYPE_VOID,
];

impl CType {
    /// True when `keyword` is this ctype's deprecated spelling.
    pub fn is_alt_keyword(&self, keyword: &str) -> bool {
        self.alt_keyword == Some(keyword)
    }

    /// Looks up a builtin ctype by keyword (preferred or alternate spelling).
    pub fn by_keyword(keyword: &str) -> Option<&'static CType> {
        BUILTIN_CTYPES
            .iter()
            .copied()
            .find(|c| c.keyword == keyword || c.is_alt_keyword(keyword))
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword)
    }
}

impl Serialize for CType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.keyword)
    }
}
