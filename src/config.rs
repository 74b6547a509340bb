//! Prelude configuration.
//!
//! A prelude file declares the descriptors a module is expanded against:
//! the selectors, primitives, citerators, hooks, matchers, fields and plain
//! values that the rest of the compiler would normally have defined. It can
//! also carry the [`ExpandOptions`] for the pass.
//!
//! ```yaml
//! module: demo
//! options:
//!   warn_shadow: true
//! selectors: [discrim]
//! primitives:
//!   - name: "+i"
//!     formals: [":long", a, ":long", b]
//!     ctype: ":long"
//! cmatchers:
//!   - name: tree_integer_cst
//!     ins: []
//!     outs: [":long", n]
//! values:
//!   - name: answer
//!     value: { integer: 42 }
//! ```
//!
//! Formal lists are written as token lists and go through the same binder as
//! source formal lists, so the same diagnostics apply.

use crate::ast::ctype::{CType, CTYPE_VALUE};
use crate::ast::{Form, Span, Symbol};
use crate::binding::{
    Binding, CIterator, CMatcher, Env, Field, FormalList, FunMatcher, Hook, Primitive, Value,
};
use crate::macros::{bind_formals, ExpandOptions, ModuleContext};
use crate::{err_msg, MexError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpansionConfig {
    pub module: Option<String>,
    pub options: ExpandOptions,
    pub selectors: Vec<String>,
    pub primitives: Vec<PrimitiveDecl>,
    pub citerators: Vec<CIteratorDecl>,
    pub hooks: Vec<HookDecl>,
    pub cmatchers: Vec<MatcherDecl>,
    pub funmatchers: Vec<FunMatcherDecl>,
    pub fields: Vec<FieldDecl>,
    pub values: Vec<ValueDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimitiveDecl {
    pub name: String,
    #[serde(default)]
    pub formals: Vec<String>,
    /// Result ctype keyword; `:value` when absent.
    #[serde(default)]
    pub ctype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CIteratorDecl {
    pub name: String,
    #[serde(default)]
    pub start: Vec<String>,
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookDecl {
    pub name: String,
    #[serde(default)]
    pub ins: Vec<String>,
    #[serde(default)]
    pub outs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatcherDecl {
    pub name: String,
    #[serde(default)]
    pub ins: Vec<String>,
    #[serde(default)]
    pub outs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunMatcherDecl {
    pub name: String,
    #[serde(default)]
    pub ins: Vec<String>,
    #[serde(default)]
    pub outs: Vec<String>,
    #[serde(default)]
    pub match_fun: Option<String>,
    #[serde(default)]
    pub apply_fun: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueDecl {
    pub name: String,
    pub value: ConfigValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigValue {
    Integer(i64),
    String(String),
    Symbol(String),
    Selector(String),
}

impl ExpansionConfig {
    /// Reads a prelude. `.json` files are JSON, everything else is YAML.
    pub fn load(path: &Path) -> Result<Self, MexError> {
        let text = fs::read_to_string(path).map_err(|source| MexError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, MexError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, MexError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Module name for the context, defaulting to `fallback`.
    pub fn module_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.module.as_deref().unwrap_or(fallback)
    }

    /// Installs every declaration into `env` and returns how many bindings
    /// were added. Formal-list problems are reported through `mcx`; an unknown
    /// result ctype is a configuration error.
    pub fn install(&self, env: &Env, mcx: &ModuleContext) -> Result<usize, MexError> {
        let check = mcx.options().check_formal_types;
        let formals = |tokens: &[String]| bind_token_formals(tokens, check, mcx);
        let before = env.len();

        for name in &self.selectors {
            env.install(Binding::selector(name));
        }
        for decl in &self.primitives {
            let ctype = match &decl.ctype {
                Some(keyword) => ctype_keyword(keyword)?,
                None => &CTYPE_VALUE,
            };
            env.install(Binding::primitive(Primitive::new(
                &decl.name,
                formals(&decl.formals),
                ctype,
            )));
        }
        for decl in &self.citerators {
            env.install(Binding::citerator(CIterator::new(
                &decl.name,
                formals(&decl.start),
                formals(&decl.vars),
            )));
        }
        for decl in &self.hooks {
            env.install(Binding::hook(Hook::new(
                &decl.name,
                formals(&decl.ins),
                formals(&decl.outs),
            )));
        }
        for decl in &self.cmatchers {
            env.install(Binding::cmatcher(CMatcher::new(
                &decl.name,
                formals(&decl.ins),
                formals(&decl.outs),
            )));
        }
        for decl in &self.funmatchers {
            let mut matcher = FunMatcher::new(&decl.name, formals(&decl.ins), formals(&decl.outs));
            matcher.match_fun = decl.match_fun.as_deref().map(Symbol::intern);
            matcher.apply_fun = decl.apply_fun.as_deref().map(Symbol::intern);
            env.install(Binding::funmatcher(matcher, None));
        }
        for decl in &self.fields {
            env.install(Binding::field(Field::new(&decl.name, &decl.class, decl.offset)));
        }
        for decl in &self.values {
            let value = match &decl.value {
                ConfigValue::Integer(n) => Value::Integer(*n),
                ConfigValue::String(s) => Value::String(s.clone()),
                ConfigValue::Symbol(s) => Value::Symbol(Symbol::intern(s)),
                ConfigValue::Selector(s) => Value::Selector(Symbol::intern(s)),
            };
            env.install(Binding::value(&decl.name, value));
        }
        Ok(env.len().saturating_sub(before))
    }
}

fn bind_token_formals(tokens: &[String], check: bool, mcx: &ModuleContext) -> FormalList {
    let form = Form::list(
        tokens.iter().map(|token| Form::sym(token)).collect(),
        Span::default(),
    );
    bind_formals(Some(&form), check, mcx)
}

fn ctype_keyword(keyword: &str) -> Result<&'static CType, MexError> {
    CType::by_keyword(keyword).ok_or_else(|| err_msg!(Config, "unknown ctype keyword {}", keyword))
}
