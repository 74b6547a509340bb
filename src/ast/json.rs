//! Reading form documents.
//!
//! The expander never parses surface syntax. Tools that need to feed it forms
//! from disk use this structured JSON document instead:
//!
//! - a JSON array is a compound form,
//! - a JSON string is a symbol (keywords keep their leading colon),
//! - a JSON integer is an integer atom,
//! - `{"str": "..."}` is a string literal.
//!
//! Compound forms get ordinal spans: `start` is the preorder index of the node
//! and `end` is one past the last node of its subtree.

use crate::ast::{Form, Span, Symbol};
use crate::{err_msg, MexError};
use serde_json::Value as Json;
use std::sync::Arc;

/// Parses a whole document: a JSON array of toplevel forms.
///
/// ```rust
/// use mexpand::ast::json::read_forms;
/// let forms = read_forms(r#"[["send", "obj", 1, {"str": "hi"}], "x"]"#).unwrap();
/// assert_eq!(forms.len(), 2);
/// assert_eq!(forms[0].pretty(), r#"(send obj 1 "hi")"#);
/// ```
pub fn read_forms(text: &str) -> Result<Vec<Form>, MexError> {
    let json: Json = serde_json::from_str(text)?;
    let Json::Array(items) = json else {
        return Err(err_msg!(Document, "toplevel must be an array of forms"));
    };
    let mut counter = 0;
    items
        .iter()
        .map(|item| form_from_json(item, &mut counter))
        .collect()
}

fn form_from_json(json: &Json, counter: &mut usize) -> Result<Form, MexError> {
    let start = *counter;
    *counter += 1;
    match json {
        Json::Array(items) => {
            let contents = items
                .iter()
                .map(|item| form_from_json(item, counter))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Form::List(Arc::new(crate::ast::Sexpr::new(
                contents,
                Span::new(start, *counter),
            ))))
        }
        Json::String(name) if name.is_empty() => {
            Err(err_msg!(Document, "empty symbol name at node {}", start))
        }
        Json::String(name) => Ok(Form::Symbol(Symbol::intern(name))),
        Json::Number(n) => n
            .as_i64()
            .map(Form::Integer)
            .ok_or_else(|| err_msg!(Document, "non-integer number {} at node {}", n, start)),
        Json::Object(map) => match (map.len(), map.get("str")) {
            (1, Some(Json::String(s))) => Ok(Form::String(s.clone())),
            _ => Err(err_msg!(
                Document,
                "object at node {} must be {{\"str\": <string>}}",
                start
            )),
        },
        other => Err(err_msg!(Document, "unsupported JSON value {} at node {}", other, start)),
    }
}
