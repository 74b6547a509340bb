//! Interned symbols.
//!
//! Every symbol name maps to exactly one [`Symbol`] for the lifetime of the
//! process, so symbols compare and hash by identity. A symbol may carry a
//! single attached [`SymbolData`] slot; ctype keywords such as `:long` use it to
//! point at their [`CType`] descriptor.

use crate::ast::ctype::{CType, BUILTIN_CTYPES};
use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

/// Data attached to a symbol's data slot.
#[derive(Debug, Clone, Copy)]
pub enum SymbolData {
    /// The symbol is the keyword (or the deprecated alternate keyword) of a ctype.
    CType(&'static CType),
}

#[derive(Debug)]
struct SymbolInner {
    name: String,
    data: OnceCell<SymbolData>,
}

/// An interned identifier. Cloning is cheap; equality is pointer identity.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

lazy_static! {
    static ref INTERNER: Mutex<HashMap<String, Symbol>> = Mutex::new(builtin_symbols());
}

// Pre-interns the ctype keywords with their data slot filled in.
fn builtin_symbols() -> HashMap<String, Symbol> {
    let mut table = HashMap::new();
    for ctype in BUILTIN_CTYPES.iter().copied() {
        for keyword in std::iter::once(ctype.keyword).chain(ctype.alt_keyword) {
            let symbol = Symbol::fresh(keyword);
            let _ = symbol.0.data.set(SymbolData::CType(ctype));
            table.insert(keyword.to_string(), symbol);
        }
    }
    table
}

impl Symbol {
    fn fresh(name: &str) -> Self {
        Symbol(Arc::new(SymbolInner {
            name: name.to_string(),
            data: OnceCell::new(),
        }))
    }

    /// Returns the unique symbol named `name`, creating it on first use.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mexpand::ast::Symbol;
    /// assert_eq!(Symbol::intern("foo"), Symbol::intern("foo"));
    /// assert_ne!(Symbol::intern("foo"), Symbol::intern("bar"));
    /// ```
    pub fn intern(name: &str) -> Self {
        let mut table = INTERNER.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        table
            .entry(name.to_string())
            .or_insert_with(|| Symbol::fresh(name))
            .clone()
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Keywords are symbols spelled with a leading colon.
    pub fn is_keyword(&self) -> bool {
        self.0.name.starts_with(':') && self.0.name.len() > 1
    }

    pub fn data(&self) -> Option<SymbolData> {
        self.0.data.get().copied()
    }

    /// The ctype attached to this keyword, if any.
    ///
    /// ```rust
    /// use mexpand::ast::Symbol;
    /// assert_eq!(Symbol::intern(":long").ctype().map(|c| c.name), Some("long"));
    /// assert!(Symbol::intern("long").ctype().is_none());
    /// ```
    pub fn ctype(&self) -> Option<&'static CType> {
        match self.data() {
            Some(SymbolData::CType(ctype)) => Some(ctype),
            None => None,
        }
    }

    /// Fills the data slot. The slot is write-once; a second attach returns the
    /// data already present.
    pub fn attach_data(&self, data: SymbolData) -> Result<(), SymbolData> {
        self.0.data.set(data).map_err(|_| self.data().unwrap_or(data))
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0.name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Symbol::intern(&name))
    }
}
