// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Replacing one function's definition inside a whole-file tree.
//!
//! The donor is a separately parsed fragment holding a rewritten version of
//! the function. Only three things move from donor to host:
//!
//! - the body, wholesale
//! - the return annotation, wholesale (removed if the donor has none)
//! - parameter annotations, matched by parameter name
//!
//! Decorators, the `def` line's name, parameter defaults and every other
//! statement in the host are left exactly as they were.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::cst::{Node, SyntaxTree};
use crate::locate::{self, LocateError};
use crate::params::{Annotation, ParamParts};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpliceError {
    /// The host tree has no top-level function with this name.
    #[error("no function named '{name}' was found")]
    NotFound { name: String },

    /// The donor fragment has no top-level function with this name.
    #[error("replacement code does not define '{name}'")]
    DonorMissing { name: String },
}

pub type SpliceResult<T> = Result<T, SpliceError>;

// ============================================================================
// Replacement
// ============================================================================

/// Replace function `name` in `host` with the donor's version and return the
/// updated host.
pub fn replace_function(
    mut host: SyntaxTree,
    name: &str,
    donor: &SyntaxTree,
) -> SpliceResult<SyntaxTree> {
    let donor_fn = locate::find(donor, name).map_err(|LocateError::NotFound { name }| {
        SpliceError::DonorMissing { name }
    })?;
    let donor_node = donor_fn.node();

    let target = locate::find_mut(&mut host, name)
        .map_err(|LocateError::NotFound { name }| SpliceError::NotFound { name })?;

    replace_body(target, donor_node);
    replace_return_annotation(target, donor_node);
    merge_parameters(target, donor_node);
    debug!(function = name, "spliced replacement into host tree");

    Ok(host)
}

fn replace_body(target: &mut Node, donor: &Node) {
    let (Some(index), Some(body)) = (target.field_index("body"), donor.child_by_field("body"))
    else {
        return;
    };
    target.children_mut()[index] = body.clone();
}

fn replace_return_annotation(target: &mut Node, donor: &Node) {
    target
        .children_mut()
        .retain(|c| c.kind() != "->" && c.field() != Some("return_type"));

    let Some(return_type) = donor.child_by_field("return_type") else {
        return;
    };
    let arrow = donor
        .children()
        .iter()
        .find(|c| c.kind() == "->")
        .cloned()
        .unwrap_or_else(|| Node::token("->", " ", "->"));
    let Some(colon) = target.child_index(":") else {
        return;
    };
    let children = target.children_mut();
    children.insert(colon, return_type.clone());
    children.insert(colon, arrow);
}

fn merge_parameters(target: &mut Node, donor: &Node) {
    let donor_params: Vec<(String, ParamParts, Node)> = donor
        .child_by_field("parameters")
        .map(|params| {
            params
                .children()
                .iter()
                .filter_map(|node| {
                    let parts = ParamParts::decompose(node)?;
                    let name = parts.name()?.to_string();
                    Some((name, parts, node.clone()))
                })
                .collect()
        })
        .unwrap_or_default();
    let by_name: HashMap<&str, &ParamParts> = donor_params
        .iter()
        .map(|(name, parts, _)| (name.as_str(), parts))
        .collect();

    let Some(params) = target.child_by_field_mut("parameters") else {
        return;
    };

    let mut host_names = Vec::new();
    for param in params.children_mut().iter_mut() {
        let Some(mut parts) = ParamParts::decompose(param) else {
            continue;
        };
        let Some(param_name) = parts.name().map(str::to_string) else {
            continue;
        };
        if let Some(donor_parts) = by_name.get(param_name.as_str()) {
            set_annotation(&mut parts, donor_parts.annotation.clone());
            let field = param.field();
            *param = parts.into_node().with_field(field);
        }
        host_names.push(param_name);
    }

    let extra: Vec<Node> = donor_params
        .iter()
        .filter(|(name, _, _)| !host_names.contains(name))
        .map(|(_, _, node)| node.clone())
        .collect();
    append_parameters(params, extra);
}

/// Swap the annotation on `parts`, spacing a default the way annotated
/// defaults are written (`x: int = 1`, not `x: int=1`).
fn set_annotation(parts: &mut ParamParts, annotation: Option<Annotation>) {
    let gains = parts.annotation.is_none() && annotation.is_some();
    parts.annotation = annotation;
    if !gains {
        return;
    }
    if let Some(default) = parts.default.as_mut() {
        if default.equals.leading().is_empty() {
            default.equals.set_leading(" ");
        }
        if default.value.leading().is_empty() {
            default.value.set_leading(" ");
        }
    }
}

fn append_parameters(params: &mut Node, extra: Vec<Node>) {
    for mut node in extra {
        let Some(close) = params.child_index(")") else {
            return;
        };
        let has_params = params.children()[..close]
            .iter()
            .any(|c| !matches!(c.kind(), "(" | ","));
        let ends_with_comma = close > 0 && params.children()[close - 1].kind() == ",";
        node.set_leading(if has_params { " " } else { "" });
        let children = params.children_mut();
        children.insert(close, node);
        if has_params && !ends_with_comma {
            children.insert(close, Node::token(",", "", ","));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;

    const HOST: &str = "\
import os

# absolute value
def abs(n):
    if n < 0:
        return -n
    else:
        return n

def other():
    pass
";

    const DONOR: &str = "\
def abs(n: int) -> int:
    \"\"\"Return the absolute value of n.\"\"\"
    if n < 0:
        return -n
    else:
        return n
";

    #[test]
    fn replaces_body_return_and_parameters() {
        let host = parse(HOST).unwrap();
        let donor = parse(DONOR).unwrap();
        let result = replace_function(host, "abs", &donor).unwrap();
        assert_eq!(
            result.serialize(),
            "\
import os

# absolute value
def abs(n: int) -> int:
    \"\"\"Return the absolute value of n.\"\"\"
    if n < 0:
        return -n
    else:
        return n

def other():
    pass
"
        );
    }

    #[test]
    fn splice_is_idempotent() {
        let donor = parse(DONOR).unwrap();
        let once = replace_function(parse(HOST).unwrap(), "abs", &donor).unwrap();
        let twice = replace_function(once.clone(), "abs", &donor).unwrap();
        assert_eq!(once.serialize(), twice.serialize());
    }

    #[test]
    fn decorators_and_defaults_stay_with_host() {
        let host = parse("@cache\ndef f(a, b=2):\n    return a + b\n").unwrap();
        let donor = parse("def f(a: int, b: int=3) -> int:\n    'Sum.'\n    return a + b\n").unwrap();
        let result = replace_function(host, "f", &donor).unwrap();
        assert_eq!(
            result.serialize(),
            "@cache\ndef f(a: int, b: int = 2) -> int:\n    'Sum.'\n    return a + b\n"
        );
    }

    #[test]
    fn host_parameters_missing_from_donor_keep_annotations() {
        let host = parse("def f(a: str, b):\n    pass\n").unwrap();
        let donor = parse("def f(b: int) -> None:\n    pass\n").unwrap();
        let result = replace_function(host, "f", &donor).unwrap();
        assert_eq!(result.serialize(), "def f(a: str, b: int) -> None:\n    pass\n");
    }

    #[test]
    fn donor_only_parameters_are_appended() {
        let host = parse("def f(a):\n    pass\n").unwrap();
        let donor = parse("def f(a: int, b: int) -> None:\n    pass\n").unwrap();
        let result = replace_function(host, "f", &donor).unwrap();
        assert_eq!(result.serialize(), "def f(a: int, b: int) -> None:\n    pass\n");
    }

    #[test]
    fn donor_only_parameter_into_empty_list() {
        let host = parse("def f():\n    pass\n").unwrap();
        let donor = parse("def f(a: int) -> None:\n    pass\n").unwrap();
        let result = replace_function(host, "f", &donor).unwrap();
        assert_eq!(result.serialize(), "def f(a: int) -> None:\n    pass\n");
    }

    #[test]
    fn return_annotation_is_replaced_or_removed() {
        let host = parse("def f() -> str:\n    pass\n").unwrap();
        let donor = parse("def f():\n    pass\n").unwrap();
        let result = replace_function(host, "f", &donor).unwrap();
        assert_eq!(result.serialize(), "def f():\n    pass\n");
    }

    #[test]
    fn async_function_is_spliced() {
        let host = parse("async def f(x):\n    await x\n").unwrap();
        let donor = parse("async def f(x: Awaitable) -> None:\n    'Wait.'\n    await x\n").unwrap();
        let result = replace_function(host, "f", &donor).unwrap();
        assert_eq!(
            result.serialize(),
            "async def f(x: Awaitable) -> None:\n    'Wait.'\n    await x\n"
        );
    }

    #[test]
    fn missing_functions_are_reported() {
        let donor = parse(DONOR).unwrap();
        assert_eq!(
            replace_function(parse("x = 1\n").unwrap(), "abs", &donor).unwrap_err(),
            SpliceError::NotFound {
                name: "abs".to_string()
            }
        );
        assert_eq!(
            replace_function(parse(HOST).unwrap(), "other", &donor).unwrap_err(),
            SpliceError::DonorMissing {
                name: "other".to_string()
            }
        );
    }
}
