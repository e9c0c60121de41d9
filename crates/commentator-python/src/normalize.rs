// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Erasing documentation and type annotations from a tree.
//!
//! The result is only meant for comparison. A function body that held
//! nothing but a docstring is left empty, which serializes to invalid
//! Python but renders canonically without trouble.

use crate::cst::Node;
use crate::docstring::is_doc_statement;
use crate::params::ParamParts;

/// Erase documentation statements everywhere under `node`.
///
/// In module, function and class bodies they are removed, so a body with a
/// docstring and the same body without one normalize identically. In any
/// other block their string is replaced by `""`.
pub fn strip_docs(node: &mut Node) {
    let removes = node.kind() == "module";
    strip_docs_in(node, removes);
}

fn strip_docs_in(node: &mut Node, removes: bool) {
    if removes {
        node.children_mut().retain(|s| !is_doc_statement(s));
    } else if node.kind() == "block" {
        for statement in node.children_mut().iter_mut() {
            if is_doc_statement(statement) {
                blank_doc_statement(statement);
            }
        }
    }

    let owns_scope = matches!(node.kind(), "function_definition" | "class_definition");
    for child in node.children_mut().iter_mut() {
        let removes = owns_scope && child.field() == Some("body") && child.kind() == "block";
        strip_docs_in(child, removes);
    }
}

fn blank_doc_statement(statement: &mut Node) {
    let leading = statement.leading().to_string();
    *statement.children_mut() = vec![Node::token("string", leading, "\"\"")];
}

/// Erase parameter annotations, return annotations and assignment
/// annotations everywhere under `node`.
pub fn strip_annotations(node: &mut Node) {
    match node.kind() {
        "function_definition" => {
            node.children_mut()
                .retain(|c| c.kind() != "->" && c.field() != Some("return_type"));
            if let Some(params) = node.child_by_field_mut("parameters") {
                strip_parameter_annotations(params);
            }
        }
        "assignment" if node.child_by_field("type").is_some() => {
            node.children_mut()
                .retain(|c| c.kind() != ":" && c.field() != Some("type"));
        }
        _ => {}
    }
    for child in node.children_mut().iter_mut() {
        strip_annotations(child);
    }
}

fn strip_parameter_annotations(params: &mut Node) {
    for param in params.children_mut().iter_mut() {
        let Some(mut parts) = ParamParts::decompose(param) else {
            continue;
        };
        if parts.annotation.take().is_some() {
            let field = param.field();
            *param = parts.into_node().with_field(field);
        }
    }
}

/// Erase both documentation and annotations.
pub fn strip_annotations_and_docs(node: &mut Node) {
    strip_docs(node);
    strip_annotations(node);
}
