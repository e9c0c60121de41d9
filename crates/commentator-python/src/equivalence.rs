// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural equivalence and completeness checks.
//!
//! Two fragments are equivalent when their trees are identical after
//! documentation and annotations are erased. Nothing deeper is attempted:
//! renaming a local, reordering parameters or rewriting `-n` as `0 - n` all
//! count as changes.

use thiserror::Error;

use crate::cst::{parse, Node, ParseError, SyntaxTree, Token};
use crate::locate::{self, first_function, FunctionDef};
use crate::normalize::{strip_annotations_and_docs, strip_docs};

// ============================================================================
// Comparison
// ============================================================================

/// Drop top-level statements before the first function definition.
///
/// Generated candidates often prepend imports for the types they use.
/// A tree with no top-level function is left alone.
pub fn trim_to_first_function(tree: &mut SyntaxTree) {
    if let Some(index) = tree
        .statements()
        .iter()
        .position(|s| locate::definition_of(s).is_some())
    {
        let statements = tree.statements_mut();
        let rest = statements.split_off(index);
        *statements = rest;
    }
}

fn normalized_canonical(tree: &SyntaxTree) -> String {
    let mut tree = tree.clone();
    trim_to_first_function(&mut tree);
    strip_annotations_and_docs(tree.root_mut());
    tree.canonical()
}

/// Whether two parsed fragments are the same program once documentation and
/// annotations are erased.
pub fn trees_equal(a: &SyntaxTree, b: &SyntaxTree) -> bool {
    normalized_canonical(a) == normalized_canonical(b)
}

/// Whether two source fragments are structurally equal. Returns `false` if
/// either fails to parse.
pub fn structurally_equal(a: &str, b: &str) -> bool {
    match (parse(a), parse(b)) {
        (Ok(a), Ok(b)) => trees_equal(&a, &b),
        _ => false,
    }
}

// ============================================================================
// Completeness
// ============================================================================

fn function_fully_typed(function: &FunctionDef<'_>) -> bool {
    let params_typed = function.parameters().iter().all(|p| {
        p.annotation
            .as_ref()
            .is_some_and(|a| !a.ty.source_text().trim().is_empty())
    });
    params_typed && function.return_annotation().is_some()
}

/// Whether the first function in `fragment` annotates every named parameter
/// and its return value.
pub fn is_fully_typed(fragment: &str) -> bool {
    parse(fragment)
        .ok()
        .is_some_and(|tree| first_function(&tree).is_some_and(|f| function_fully_typed(&f)))
}

/// Whether the first function in `fragment` starts with a non-empty
/// docstring.
pub fn has_documentation(fragment: &str) -> bool {
    parse(fragment).ok().is_some_and(|tree| {
        first_function(&tree)
            .and_then(|f| f.docstring())
            .is_some_and(|doc| !doc.is_empty())
    })
}

/// Whether `after` carries annotations that `before` lacks.
///
/// Only documentation is erased, from both sides, before comparing. Erasing
/// annotations from `after` as well would make the two sides agree whenever
/// the rewrite differs from `before` in annotations alone, which is exactly
/// the case to detect. Callers pass fragments that are already structurally
/// equal, so any remaining difference is typing. Either side failing to
/// parse counts as no gain.
pub fn gained_typing(before: &str, after: &str) -> bool {
    match (parse(before), parse(after)) {
        (Ok(mut before), Ok(mut after)) => {
            strip_docs(before.root_mut());
            strip_docs(after.root_mut());
            before.canonical() != after.canonical()
        }
        _ => false,
    }
}

// ============================================================================
// Annotation Validity
// ============================================================================

/// Expression kinds Python refuses inside an annotation.
const FORBIDDEN_IN_ANNOTATION: &[(&str, &str)] = &[
    ("yield", "'yield'"),
    ("await", "'await'"),
    ("named_expression", "an assignment expression"),
];

/// Describe the first annotation in `tree` that the grammar accepts but
/// Python will not compile, if any.
///
/// Two shapes are caught: `yield`, `await` or `:=` inside a parameter,
/// return or variable annotation, and an annotated assignment to a name the
/// same scope declares `global` or `nonlocal`.
pub fn annotation_error(tree: &SyntaxTree) -> Option<String> {
    tree.root()
        .descendants()
        .flat_map(annotations_of)
        .find_map(forbidden_expression)
        .or_else(|| annotated_declared_name(tree.root()))
}

fn annotations_of(node: &Node) -> Vec<&Node> {
    match node.kind() {
        "function_definition" => {
            let mut found: Vec<&Node> = node.child_by_field("return_type").into_iter().collect();
            if let Some(params) = node.child_by_field("parameters") {
                found.extend(params.children().iter().filter_map(|p| p.child_by_field("type")));
            }
            found
        }
        "assignment" => node.child_by_field("type").into_iter().collect(),
        _ => Vec::new(),
    }
}

fn forbidden_expression(annotation: &Node) -> Option<String> {
    if let Some((_, label)) = FORBIDDEN_IN_ANNOTATION
        .iter()
        .find(|(kind, _)| *kind == annotation.kind())
    {
        return Some(format!("{} is not allowed in an annotation", label));
    }
    if annotation.kind() == "lambda" {
        return None;
    }
    annotation.children().iter().find_map(forbidden_expression)
}

/// Names bound by `global` and `nonlocal` statements, and names given a
/// variable annotation, within one scope.
#[derive(Default)]
struct ScopeNames<'t> {
    declared: Vec<(&'t str, &'static str)>,
    annotated: Vec<&'t str>,
}

fn annotated_declared_name(module: &Node) -> Option<String> {
    let mut scopes = vec![module];
    while let Some(scope) = scopes.pop() {
        let mut names = ScopeNames::default();
        collect_scope(scope, &mut names, &mut scopes);
        for name in &names.annotated {
            if let Some((_, keyword)) = names.declared.iter().find(|(d, _)| d == name) {
                return Some(format!("annotated name '{}' can't be {}", name, keyword));
            }
        }
    }
    None
}

fn collect_scope<'t>(node: &'t Node, names: &mut ScopeNames<'t>, nested: &mut Vec<&'t Node>) {
    for child in node.children() {
        match child.kind() {
            "global_statement" | "nonlocal_statement" => {
                let keyword = if child.kind() == "global_statement" {
                    "global"
                } else {
                    "nonlocal"
                };
                names.declared.extend(
                    child
                        .children()
                        .iter()
                        .filter(|c| c.kind() == "identifier")
                        .filter_map(Node::as_token)
                        .map(|t| (t.text(), keyword)),
                );
            }
            "function_definition" | "class_definition" => {
                nested.extend(child.child_by_field("body"));
            }
            _ => {
                if child.kind() == "assignment" && child.child_by_field("type").is_some() {
                    if let Some(name) = child
                        .child_by_field("left")
                        .filter(|left| left.kind() == "identifier")
                        .and_then(Node::as_token)
                        .map(Token::text)
                    {
                        names.annotated.push(name);
                    }
                }
                collect_scope(child, names, nested);
            }
        }
    }
}

// ============================================================================
// Candidate Gate
// ============================================================================

/// Why a generated candidate was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("candidate does not parse: {0}")]
    Parse(#[from] ParseError),

    #[error("candidate does not compile: {detail}")]
    InvalidAnnotation { detail: String },

    #[error("candidate changes the code beyond documentation and annotations")]
    NotEquivalent,

    #[error("candidate does not annotate every parameter and the return value")]
    MissingTypes,

    #[error("candidate does not define '{name}'")]
    MissingFunction { name: String },
}

/// Run a candidate for function `name` through every acceptance check, in
/// order: parse, annotation validity, structural equality with `original`,
/// full typing, and presence of `name` at top level.
///
/// Returns the parsed candidate, ready to be spliced.
pub fn check_candidate(
    original: &SyntaxTree,
    name: &str,
    candidate: &str,
) -> Result<SyntaxTree, Rejection> {
    let donor = parse(candidate)?;
    if let Some(detail) = annotation_error(&donor) {
        return Err(Rejection::InvalidAnnotation { detail });
    }
    if !trees_equal(original, &donor) {
        return Err(Rejection::NotEquivalent);
    }
    if !first_function(&donor).is_some_and(|f| function_fully_typed(&f)) {
        return Err(Rejection::MissingTypes);
    }
    if locate::find(&donor, name).is_err() {
        return Err(Rejection::MissingFunction {
            name: name.to_string(),
        });
    }
    Ok(donor)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABS: &str = "def abs(n):\n    if n < 0:\n        return -n\n    else:\n        return n\n";

    #[test]
    fn documented_and_typed_abs_is_equal() {
        let candidate = "\
def abs(n: int) -> int:
    \"\"\"Return the absolute value of n.\"\"\"
    # negative?
    if n < 0:
        return -n
    else:
        return n
";
        assert!(structurally_equal(ABS, candidate));
    }

    #[test]
    fn changed_expression_is_unequal() {
        let candidate = "def abs(n):\n    if n < 0:\n        return n\n    else:\n        return n\n";
        assert!(!structurally_equal(ABS, candidate));
    }

    #[test]
    fn parse_failure_is_unequal() {
        assert!(!structurally_equal(ABS, "def abs(n:\n"));
        assert!(!structurally_equal("def abs(n:\n", "def abs(n:\n"));
    }

    #[test]
    fn prepended_imports_are_ignored() {
        let candidate = "from typing import Any\n\ndef abs(n: Any) -> Any:\n    if n < 0:\n        return -n\n    else:\n        return n\n";
        assert!(structurally_equal(ABS, candidate));
    }

    #[test]
    fn parameter_order_matters() {
        assert!(!structurally_equal(
            "def f(a, b):\n    pass\n",
            "def f(b: int, a: int) -> None:\n    pass\n"
        ));
    }

    #[test]
    fn fully_typed_requires_every_parameter_and_return() {
        assert!(is_fully_typed("def f(a: int, *rest: str) -> None:\n    pass\n"));
        assert!(!is_fully_typed("def f(a: int, b) -> None:\n    pass\n"));
        assert!(!is_fully_typed("def f(a: int):\n    pass\n"));
        assert!(is_fully_typed("def f() -> int:\n    return 1\n"));
        assert!(!is_fully_typed("x = 1\n"));
    }

    #[test]
    fn documentation_detection() {
        assert!(has_documentation("def f():\n    '''Doc.'''\n"));
        assert!(!has_documentation("def f():\n    ''\n"));
        assert!(!has_documentation("def f():\n    f'{x}'\n"));
        assert!(!has_documentation("def f():\n    return 1\n"));
        assert!(!has_documentation("def f(:\n"));
    }

    #[test]
    fn gained_typing_detects_new_annotations() {
        let before = "def f(a):\n    return a\n";
        assert!(gained_typing(before, "def f(a: int) -> int:\n    return a\n"));
        assert!(!gained_typing(before, "def f(a):\n    return a\n"));
        assert!(!gained_typing(before, "def f(a):\n    \"\"\"Echo.\"\"\"\n    return a\n"));
    }

    #[test]
    fn check_candidate_order() {
        let original = parse(ABS).unwrap();
        assert!(matches!(
            check_candidate(&original, "abs", "def abs(n:\n"),
            Err(Rejection::Parse(_))
        ));
        assert_eq!(
            check_candidate(&original, "abs", ABS).unwrap_err(),
            Rejection::MissingTypes
        );
        let renamed = "def absolute(n: int) -> int:\n    if n < 0:\n        return -n\n    else:\n        return n\n";
        assert_eq!(
            check_candidate(&original, "abs", renamed).unwrap_err(),
            Rejection::NotEquivalent
        );
    }

    #[test]
    fn gained_typing_ignores_documentation_only_changes() {
        let before = "def f(a: int) -> int:\n    return a\n";
        let after = "def f(a: int) -> int:\n    '''Echo.'''\n    return a\n";
        assert!(!gained_typing(before, after));
        assert!(gained_typing(before, "def f(a: float) -> int:\n    return a\n"));
    }

    #[test]
    fn yield_and_await_in_annotations_are_rejected() {
        let original = parse(ABS).unwrap();
        for candidate in [
            "def abs(n: (yield)) -> int:\n    if n < 0:\n        return -n\n    else:\n        return n\n",
            "def abs(n: int) -> (yield from x):\n    if n < 0:\n        return -n\n    else:\n        return n\n",
            "def abs(n: int) -> await x:\n    if n < 0:\n        return -n\n    else:\n        return n\n",
            "def abs(n: (y := int)) -> int:\n    if n < 0:\n        return -n\n    else:\n        return n\n",
        ] {
            assert!(
                matches!(
                    check_candidate(&original, "abs", candidate),
                    Err(Rejection::InvalidAnnotation { .. })
                ),
                "accepted: {}",
                candidate
            );
        }
    }

    #[test]
    fn annotated_global_is_rejected() {
        let original = parse("def bump():\n    global X\n    X = 1\n").unwrap();
        let candidate = "def bump() -> None:\n    global X\n    X: int = 1\n";
        assert_eq!(
            check_candidate(&original, "bump", candidate).unwrap_err(),
            Rejection::InvalidAnnotation {
                detail: "annotated name 'X' can't be global".to_string()
            }
        );
    }

    #[test]
    fn annotated_nonlocal_is_rejected_in_its_own_scope_only() {
        let nonlocal = parse("def outer():\n    x = 0\n    def inner():\n        nonlocal x\n        x: int = 1\n").unwrap();
        assert_eq!(
            annotation_error(&nonlocal).as_deref(),
            Some("annotated name 'x' can't be nonlocal")
        );

        let separate = parse("X = 0\n\ndef f():\n    global X\n    X = 1\n\ndef g():\n    X: int = 2\n").unwrap();
        assert_eq!(annotation_error(&separate), None);
    }

    #[test]
    fn ordinary_annotations_are_valid() {
        let tree = parse("def f(a: list[int], *b: str, c: int = 1) -> Callable[[int], int]:\n    x: int = a[0]\n    return lambda y: y\n").unwrap();
        assert_eq!(annotation_error(&tree), None);
    }

    #[test]
    fn check_candidate_accepts_good_rewrite() {
        let original = parse(ABS).unwrap();
        let candidate = "def abs(n: int) -> int:\n    '''Absolute value.'''\n    if n < 0:\n        return -n\n    else:\n        return n\n";
        let donor = check_candidate(&original, "abs", candidate).unwrap();
        assert_eq!(locate::enumerate(&donor), vec!["abs"]);
    }
}
