// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Finding top-level functions by name.
//!
//! Only module-level definitions are addressable. A decorated definition is
//! addressed through its `decorated_definition` wrapper, so decorators travel
//! with the function when its source is extracted.

use std::ops::Range;

use thiserror::Error;

use crate::cst::{Node, SyntaxTree};
use crate::params::ParamParts;

// ============================================================================
// Error Types
// ============================================================================

/// Error from function lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    /// No top-level function (sync or async) has this name.
    #[error("no function named '{name}' was found")]
    NotFound { name: String },
}

/// Result type for lookup operations.
pub type LocateResult<T> = Result<T, LocateError>;

// ============================================================================
// Function View
// ============================================================================

/// Whether a definition is `def` or `async def`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Sync,
    Async,
}

/// Read-only view of a `function_definition` node.
///
/// Sync and async definitions share one node shape; [`FunctionDef::kind`]
/// tells them apart and everything else works the same for both.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDef<'t> {
    node: &'t Node,
}

impl<'t> FunctionDef<'t> {
    /// Wrap a node, if it is a function definition.
    pub fn new(node: &'t Node) -> Option<Self> {
        (node.kind() == "function_definition").then_some(FunctionDef { node })
    }

    pub fn node(&self) -> &'t Node {
        self.node
    }

    pub fn name(&self) -> &'t str {
        self.node
            .child_by_field("name")
            .and_then(Node::as_token)
            .map(|t| t.text())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> FunctionKind {
        match self.node.children().first() {
            Some(first) if first.kind() == "async" => FunctionKind::Async,
            _ => FunctionKind::Sync,
        }
    }

    /// Named parameters in declaration order. Separators are skipped.
    pub fn parameters(&self) -> Vec<ParamParts> {
        self.node
            .child_by_field("parameters")
            .map(|params| {
                params
                    .children()
                    .iter()
                    .filter_map(ParamParts::decompose)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `type` node after `->`, if any.
    pub fn return_annotation(&self) -> Option<&'t Node> {
        self.node.child_by_field("return_type")
    }

    pub fn body(&self) -> Option<&'t Node> {
        self.node.child_by_field("body")
    }

    /// Text of the docstring, if the first body statement is one.
    pub fn docstring(&self) -> Option<String> {
        let first = self.body()?.children().first()?;
        crate::docstring::statement_docstring(first)
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// The function definition inside a top-level statement, looking through
/// decorators.
pub fn definition_of(statement: &Node) -> Option<&Node> {
    match statement.kind() {
        "function_definition" => Some(statement),
        "decorated_definition" => statement
            .child_by_field("definition")
            .filter(|d| d.kind() == "function_definition"),
        _ => None,
    }
}

fn definition_of_mut(statement: &mut Node) -> Option<&mut Node> {
    match statement.kind() {
        "function_definition" => Some(statement),
        "decorated_definition" => statement
            .child_by_field_mut("definition")
            .filter(|d| d.kind() == "function_definition"),
        _ => None,
    }
}

/// Names of all top-level functions, in source order.
///
/// Duplicates are reported as often as they are defined.
pub fn enumerate(tree: &SyntaxTree) -> Vec<String> {
    tree.statements()
        .iter()
        .filter_map(definition_of)
        .filter_map(FunctionDef::new)
        .map(|f| f.name().to_string())
        .collect()
}

/// Index of the top-level statement defining `name`.
pub fn statement_index(tree: &SyntaxTree, name: &str) -> Option<usize> {
    tree.statements().iter().position(|s| {
        definition_of(s)
            .and_then(FunctionDef::new)
            .is_some_and(|f| f.name() == name)
    })
}

/// Find the first top-level function called `name`.
pub fn find<'t>(tree: &'t SyntaxTree, name: &str) -> LocateResult<FunctionDef<'t>> {
    statement_index(tree, name)
        .and_then(|i| definition_of(&tree.statements()[i]))
        .and_then(FunctionDef::new)
        .ok_or_else(|| LocateError::NotFound {
            name: name.to_string(),
        })
}

/// Mutable access to the `function_definition` node called `name`.
pub fn find_mut<'t>(tree: &'t mut SyntaxTree, name: &str) -> LocateResult<&'t mut Node> {
    let not_found = || LocateError::NotFound {
        name: name.to_string(),
    };
    let index = statement_index(tree, name).ok_or_else(not_found)?;
    definition_of_mut(&mut tree.statements_mut()[index]).ok_or_else(not_found)
}

/// Source text of the function called `name`, decorators included and
/// preceding blank lines or comments excluded.
pub fn extract_source(tree: &SyntaxTree, name: &str) -> LocateResult<String> {
    let index = statement_index(tree, name).ok_or_else(|| LocateError::NotFound {
        name: name.to_string(),
    })?;
    Ok(tree.statements()[index].source_text())
}

/// The first function in the tree: the first top-level one if there is any,
/// otherwise the first nested one in pre-order.
pub fn first_function(tree: &SyntaxTree) -> Option<FunctionDef<'_>> {
    tree.statements()
        .iter()
        .filter_map(definition_of)
        .find_map(FunctionDef::new)
        .or_else(|| tree.root().descendants().find_map(FunctionDef::new))
}

/// Byte range of the top-level statement defining `name` within the
/// serialized tree, without its leading trivia.
pub fn function_span(tree: &SyntaxTree, name: &str) -> LocateResult<Range<usize>> {
    let index = statement_index(tree, name).ok_or_else(|| LocateError::NotFound {
        name: name.to_string(),
    })?;
    Ok(tree.statement_spans()[index].clone())
}
