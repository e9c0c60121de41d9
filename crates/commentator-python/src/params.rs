// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Decomposition of parameter nodes into pattern, annotation and default.
//!
//! tree-sitter-python spells one parameter five different ways depending on
//! which optional parts are present:
//!
//! | source          | node kind                  |
//! |-----------------|----------------------------|
//! | `x`             | `identifier`               |
//! | `*args`         | `list_splat_pattern`       |
//! | `x: int`        | `typed_parameter`          |
//! | `x=1`           | `default_parameter`        |
//! | `x: int = 1`    | `typed_default_parameter`  |
//!
//! [`ParamParts`] flattens these into one shape so annotations can be added,
//! replaced or removed without caring which spelling the source used, and
//! [`ParamParts::into_node`] picks the right spelling back.

use crate::cst::Node;

/// A `: <type>` annotation: the colon token and the `type` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub colon: Node,
    pub ty: Node,
}

/// A `= <value>` default: the equals token and the value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue {
    pub equals: Node,
    pub value: Node,
}

/// One named parameter split into its optional parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamParts {
    pub pattern: Node,
    pub annotation: Option<Annotation>,
    pub default: Option<DefaultValue>,
}

impl ParamParts {
    /// Split a parameter node. Returns `None` for separators (`*`, `/`) and
    /// shapes that do not name a parameter.
    pub fn decompose(node: &Node) -> Option<ParamParts> {
        match node.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => Some(ParamParts {
                pattern: node.clone().with_field(None),
                annotation: None,
                default: None,
            }),
            "typed_parameter" => {
                let pattern = node
                    .children()
                    .iter()
                    .find(|c| c.kind() != ":" && c.field() != Some("type"))?;
                Some(ParamParts {
                    pattern: pattern.clone().with_field(None),
                    annotation: Some(annotation_of(node)?),
                    default: None,
                })
            }
            "default_parameter" => Some(ParamParts {
                pattern: node.child_by_field("name")?.clone().with_field(None),
                annotation: None,
                default: Some(default_of(node)?),
            }),
            "typed_default_parameter" => Some(ParamParts {
                pattern: node.child_by_field("name")?.clone().with_field(None),
                annotation: Some(annotation_of(node)?),
                default: Some(default_of(node)?),
            }),
            _ => None,
        }
    }

    /// The bare parameter name (`args` for `*args`).
    pub fn name(&self) -> Option<&str> {
        pattern_name(&self.pattern)
    }

    /// Reassemble the parameter using the node kind that matches the parts
    /// present.
    pub fn into_node(self) -> Node {
        let ParamParts {
            pattern,
            annotation,
            default,
        } = self;
        match (annotation, default) {
            (None, None) => pattern,
            (Some(annotation), None) => Node::branch(
                "typed_parameter",
                vec![
                    pattern,
                    annotation.colon,
                    annotation.ty.with_field(Some("type")),
                ],
            ),
            (None, Some(default)) => Node::branch(
                "default_parameter",
                vec![
                    pattern.with_field(Some("name")),
                    default.equals,
                    default.value.with_field(Some("value")),
                ],
            ),
            (Some(annotation), Some(default)) => Node::branch(
                "typed_default_parameter",
                vec![
                    pattern.with_field(Some("name")),
                    annotation.colon,
                    annotation.ty.with_field(Some("type")),
                    default.equals,
                    default.value.with_field(Some("value")),
                ],
            ),
        }
    }
}

/// Name bound by a parameter pattern.
pub fn pattern_name(pattern: &Node) -> Option<&str> {
    match pattern.kind() {
        "identifier" => pattern.as_token().map(|t| t.text()),
        "list_splat_pattern" | "dictionary_splat_pattern" => pattern
            .children()
            .iter()
            .find(|c| c.kind() == "identifier")
            .and_then(|c| c.as_token())
            .map(|t| t.text()),
        _ => None,
    }
}

fn annotation_of(node: &Node) -> Option<Annotation> {
    let colon = node.children().iter().find(|c| c.kind() == ":")?;
    let ty = node.child_by_field("type")?;
    Some(Annotation {
        colon: colon.clone(),
        ty: ty.clone().with_field(None),
    })
}

fn default_of(node: &Node) -> Option<DefaultValue> {
    let equals = node.children().iter().find(|c| c.kind() == "=")?;
    let value = node.child_by_field("value")?;
    Some(DefaultValue {
        equals: equals.clone(),
        value: value.clone().with_field(None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse;

    fn params_of(source: &str) -> Vec<Node> {
        let tree = parse(source).unwrap();
        let function = &tree.statements()[0];
        function
            .child_by_field("parameters")
            .unwrap()
            .children()
            .to_vec()
    }

    #[test]
    fn decompose_every_spelling() {
        let params = params_of("def f(a, b: int, c=1, d: str = 'x', *args, **kw):\n    pass\n");
        let parts: Vec<ParamParts> = params.iter().filter_map(ParamParts::decompose).collect();
        let names: Vec<&str> = parts.iter().filter_map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "args", "kw"]);

        assert!(parts[0].annotation.is_none());
        assert_eq!(parts[1].annotation.as_ref().unwrap().ty.source_text(), "int");
        assert_eq!(parts[2].default.as_ref().unwrap().value.source_text(), "1");
        assert_eq!(parts[3].annotation.as_ref().unwrap().ty.source_text(), "str");
        assert_eq!(parts[3].default.as_ref().unwrap().value.source_text(), "'x'");
    }

    #[test]
    fn separators_are_not_parameters() {
        let params = params_of("def f(a, /, b, *, c):\n    pass\n");
        let names: Vec<String> = params
            .iter()
            .filter_map(ParamParts::decompose)
            .filter_map(|p| p.name().map(str::to_string))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn into_node_roundtrips_source() {
        let params = params_of("def f(a, b: int, c=1, d: str = 'x'):\n    pass\n");
        for param in params.iter().filter(|p| ParamParts::decompose(p).is_some()) {
            let rebuilt = ParamParts::decompose(param).unwrap().into_node();
            assert_eq!(rebuilt.source_text(), param.source_text());
            assert_eq!(rebuilt.kind(), param.kind());
        }
    }

    #[test]
    fn dropping_annotation_matches_untyped_spelling() {
        let typed = params_of("def f(c: int = 1):\n    pass\n");
        let plain = params_of("def f(c=1):\n    pass\n");
        let mut parts = ParamParts::decompose(&typed[1]).unwrap();
        parts.annotation = None;
        assert_eq!(parts.into_node().canonical(), plain[1].canonical());
    }
}
