// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recognizing documentation strings.
//!
//! A documentation statement is an expression statement whose only
//! expression is a plain string literal: no `f`, `b` or `t` prefix, possibly
//! implicitly concatenated, possibly parenthesized. Raw and unicode prefixes
//! are allowed.

use crate::cst::Node;

/// Split a string literal token into `(prefix, body)`, where `body` is the
/// text between the quotes. Returns `None` if the text is not a literal.
pub fn split_literal(text: &str) -> Option<(&str, &str)> {
    let quote_at = text.find(['\'', '"'])?;
    let (prefix, quoted) = text.split_at(quote_at);
    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let body = ["\"\"\"", "'''", "\"", "'"]
        .iter()
        .find_map(|q| {
            quoted
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
                .filter(|_| quoted.len() >= 2 * q.len())
        })?;
    Some((prefix, body))
}

/// Whether a prefix marks a literal that is not a plain `str` constant.
fn is_computed_prefix(prefix: &str) -> bool {
    prefix
        .chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'f' | 'b' | 't'))
}

/// Body text of a plain string expression, or `None` for f-strings, bytes
/// and anything that is not a string.
pub fn plain_string_value(expr: &Node) -> Option<String> {
    match expr.kind() {
        "string" => {
            let (prefix, body) = split_literal(expr.as_token()?.text())?;
            (!is_computed_prefix(prefix)).then(|| body.to_string())
        }
        "concatenated_string" => {
            let mut value = String::new();
            for part in expr.children() {
                value.push_str(&plain_string_value(part)?);
            }
            Some(value)
        }
        "parenthesized_expression" => {
            let inner: Vec<&Node> = expr
                .children()
                .iter()
                .filter(|c| !matches!(c.kind(), "(" | ")"))
                .collect();
            match inner.as_slice() {
                [only] => plain_string_value(only),
                _ => None,
            }
        }
        _ => None,
    }
}

/// The string value of a documentation statement, or `None` if `statement`
/// is anything else.
pub fn statement_docstring(statement: &Node) -> Option<String> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    match statement.children() {
        [expr] => plain_string_value(expr),
        _ => None,
    }
}

pub fn is_doc_statement(statement: &Node) -> bool {
    statement_docstring(statement).is_some()
}
