// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Lossless concrete syntax tree for Python source.
//!
//! tree-sitter-python does the grammar work; this module converts its
//! borrowed, immutable tree into an owned [`SyntaxTree`] that can be edited
//! in place and written back out.
//!
//! # Trivia
//!
//! Every token carries the text that precedes it in the source (whitespace,
//! newlines, comments, line continuations). Writing all tokens with their
//! leading trivia, followed by the tree's trailing trivia, reproduces the
//! input byte for byte:
//!
//! ```
//! use commentator_python::cst::parse;
//!
//! let source = "def f(x):  # note\n    return x\n";
//! let tree = parse(source).unwrap();
//! assert_eq!(tree.serialize(), source);
//! ```
//!
//! # Canonical form
//!
//! [`SyntaxTree::canonical`] renders only node kinds and token texts, so
//! comments, indentation width and line layout never affect it. Two trees
//! with equal canonical forms have the same structure.

use std::fmt::Write as _;
use std::ops::Range;

use thiserror::Error;
use tree_sitter::{Node as TsNode, Parser};

/// Node kinds kept as a single token even though tree-sitter gives them
/// children. String literals are compared and rewritten as whole units.
const ATOMIC_KINDS: &[&str] = &["string"];

// ============================================================================
// Error Types
// ============================================================================

/// Error produced when source text is not valid Python.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The grammar rejected the text. Position is 1-indexed.
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    /// The Python grammar could not be loaded into the parser.
    #[error("failed to load the Python grammar: {0}")]
    Grammar(String),

    /// The parser gave up without producing a tree.
    #[error("parser produced no tree")]
    NoTree,
}

/// Result type for parsing.
pub type ParseResult<T> = Result<T, ParseError>;

// ============================================================================
// Nodes
// ============================================================================

/// A single token together with the trivia that precedes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    leading: String,
    text: String,
}

impl Token {
    /// Whitespace, comments and newlines before the token.
    pub fn leading(&self) -> &str {
        &self.leading
    }

    /// The token text itself.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_leading(&mut self, leading: impl Into<String>) {
        self.leading = leading.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// A node of the owned tree.
///
/// Token nodes carry a [`Token`] and no children; branch nodes carry
/// children and no token. `kind` is the tree-sitter-python node kind
/// (`function_definition`, `parameters`, `":"` ...), `field` the grammar
/// field this node fills in its parent, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: &'static str,
    field: Option<&'static str>,
    token: Option<Token>,
    children: Vec<Node>,
}

impl Node {
    /// Create a token node.
    pub fn token(kind: &'static str, leading: impl Into<String>, text: impl Into<String>) -> Self {
        Node {
            kind,
            field: None,
            token: Some(Token {
                leading: leading.into(),
                text: text.into(),
            }),
            children: Vec::new(),
        }
    }

    /// Create a branch node.
    pub fn branch(kind: &'static str, children: Vec<Node>) -> Self {
        Node {
            kind,
            field: None,
            token: None,
            children,
        }
    }

    /// Return this node filling `field` in its parent.
    pub fn with_field(mut self, field: Option<&'static str>) -> Self {
        self.field = field;
        self
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn is_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn as_token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// First direct child filling `field`.
    pub fn child_by_field(&self, field: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.field == Some(field))
    }

    pub fn child_by_field_mut(&mut self, field: &str) -> Option<&mut Node> {
        self.children.iter_mut().find(|c| c.field == Some(field))
    }

    /// Index of the first direct child of the given kind.
    pub fn child_index(&self, kind: &str) -> Option<usize> {
        self.children.iter().position(|c| c.kind == kind)
    }

    /// Index of the first direct child filling `field`.
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.children.iter().position(|c| c.field == Some(field))
    }

    /// The first token in this subtree.
    pub fn first_token(&self) -> Option<&Token> {
        match &self.token {
            Some(token) => Some(token),
            None => self.children.iter().find_map(|c| c.first_token()),
        }
    }

    pub fn first_token_mut(&mut self) -> Option<&mut Token> {
        match &mut self.token {
            Some(token) => Some(token),
            None => self.children.iter_mut().find_map(|c| c.first_token_mut()),
        }
    }

    /// Leading trivia of the first token, or `""` for an empty subtree.
    pub fn leading(&self) -> &str {
        self.first_token().map(Token::leading).unwrap_or_default()
    }

    /// Replace the leading trivia of the first token.
    pub fn set_leading(&mut self, leading: impl Into<String>) {
        if let Some(token) = self.first_token_mut() {
            token.set_leading(leading);
        }
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Append the exact source of this subtree, leading trivia included.
    pub fn write_source(&self, out: &mut String) {
        if let Some(token) = &self.token {
            out.push_str(&token.leading);
            out.push_str(&token.text);
        }
        for child in &self.children {
            child.write_source(out);
        }
    }

    /// Source text of this subtree without the leading trivia of its first
    /// token.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        let skip = self.leading().len();
        out.split_off(skip)
    }

    /// Append the trivia-free structural rendering of this subtree.
    pub fn write_canonical(&self, out: &mut String) {
        if let Some(token) = &self.token {
            let _ = write!(out, "{:?}", token.text);
            return;
        }
        out.push('(');
        out.push_str(self.kind);
        for child in &self.children {
            out.push(' ');
            child.write_canonical(out);
        }
        out.push(')');
    }

    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }
}

/// Pre-order traversal returned by [`Node::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ============================================================================
// Syntax Tree
// ============================================================================

/// An owned, editable, lossless tree for one Python module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    root: Node,
    trailing: String,
    bom: bool,
}

impl SyntaxTree {
    /// The `module` node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Top-level statements in source order.
    pub fn statements(&self) -> &[Node] {
        self.root.children()
    }

    pub fn statements_mut(&mut self) -> &mut Vec<Node> {
        self.root.children_mut()
    }

    /// Trivia after the last token (final newline, trailing comments).
    pub fn trailing(&self) -> &str {
        &self.trailing
    }

    /// Write the tree back to source text.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        self.root.write_source(&mut out);
        out.push_str(&self.trailing);
        out
    }

    /// Trivia-free structural rendering of the whole module.
    pub fn canonical(&self) -> String {
        self.root.canonical()
    }

    /// Byte ranges of each top-level statement within [`serialize`]'s
    /// output, excluding the statement's leading trivia.
    ///
    /// [`serialize`]: SyntaxTree::serialize
    pub fn statement_spans(&self) -> Vec<Range<usize>> {
        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        let mut spans = Vec::with_capacity(self.statements().len());
        for statement in self.statements() {
            let start = out.len() + statement.leading().len();
            statement.write_source(&mut out);
            spans.push(start..out.len());
        }
        spans
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse Python source into an owned [`SyntaxTree`].
///
/// Any error or missing node anywhere in the parse is reported as
/// [`ParseError::Syntax`] at the position of the first one.
pub fn parse(text: &str) -> ParseResult<SyntaxTree> {
    let (bom, source) = match text.strip_prefix('\u{feff}') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| ParseError::Grammar(err.to_string()))?;
    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
    let root = tree.root_node();

    if root.has_error() {
        let (line, column) = first_error_position(root);
        return Err(ParseError::Syntax { line, column });
    }
    // The grammar tolerates a suite with no statements; Python does not.
    if let Some((line, column)) = first_empty_block(root) {
        return Err(ParseError::Syntax { line, column });
    }
    if let Some((line, column)) = inconsistent_indentation(root, source) {
        return Err(ParseError::Syntax { line, column });
    }

    let mut pos = 0;
    let children = build_children(root, source, &mut pos);
    let trailing = slice(source, pos, source.len());

    Ok(SyntaxTree {
        root: Node::branch("module", children),
        trailing,
        bom,
    })
}

fn build_children(node: TsNode<'_>, source: &str, pos: &mut usize) -> Vec<Node> {
    let mut children = Vec::with_capacity(node.child_count());
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            // Comments and line continuations become trivia of the next token.
            if !child.is_extra() {
                children.push(build_node(child, cursor.field_name(), source, pos));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    children
}

fn build_node(
    node: TsNode<'_>,
    field: Option<&'static str>,
    source: &str,
    pos: &mut usize,
) -> Node {
    let built = if node.child_count() == 0 || ATOMIC_KINDS.contains(&node.kind()) {
        let start = node.start_byte();
        let end = node.end_byte();
        let leading = slice(source, *pos, start);
        let text = slice(source, start, end);
        *pos = (*pos).max(end);
        Node::token(node.kind(), leading, text)
    } else {
        Node::branch(node.kind(), build_children(node, source, pos))
    };
    built.with_field(field)
}

fn slice(source: &str, start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    source.get(start..end).unwrap_or_default().to_string()
}

fn first_error_position(node: TsNode<'_>) -> (usize, usize) {
    if node.is_error() || node.is_missing() {
        let point = node.start_position();
        return (point.row + 1, point.column + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error_position(child);
        }
    }
    let point = node.start_position();
    (point.row + 1, point.column + 1)
}

fn first_empty_block(node: TsNode<'_>) -> Option<(usize, usize)> {
    let mut cursor = node.walk();
    let children: Vec<TsNode<'_>> = node.children(&mut cursor).collect();
    if node.kind() == "block" && children.iter().all(|c| c.is_extra()) {
        let point = node.start_position();
        return Some((point.row + 1, point.column + 1));
    }
    children.into_iter().find_map(first_empty_block)
}

/// Nodes that open a logical line of their own when they start a physical
/// line: clause headers of compound statements and decorators.
const LINE_START_KINDS: &[&str] = &[
    "elif_clause",
    "else_clause",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "case_clause",
    "decorator",
];

/// Check indentation the way the Python tokenizer does: every logical line's
/// leading whitespace is measured with tabs as 8 columns and as 1 column,
/// and both measurements must order the lines the same way. The grammar
/// only looks at the first, so `\t` and eight spaces look alike to it.
///
/// Returns the 1-indexed position of the first inconsistent line.
fn inconsistent_indentation(root: TsNode<'_>, source: &str) -> Option<(usize, usize)> {
    let mut starts = Vec::new();
    collect_line_starts(root, &mut starts);
    starts.sort_unstable();
    starts.dedup();

    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    for (byte, row) in starts {
        let before = source.get(..byte)?;
        let indent = &before[before.rfind('\n').map_or(0, |i| i + 1)..];
        if !indent.chars().all(|c| matches!(c, ' ' | '\t' | '\x0c')) {
            // Shares a line with an earlier statement.
            continue;
        }
        let (col, alt) = indent_columns(indent);
        let (top, alt_top) = stack.last().copied().unwrap_or((0, 0));
        let consistent = if col == top {
            alt == alt_top
        } else if col > top {
            stack.push((col, alt));
            alt > alt_top
        } else {
            while stack.len() > 1 && stack.last().is_some_and(|&(c, _)| col < c) {
                stack.pop();
            }
            stack.last() == Some(&(col, alt))
        };
        if !consistent {
            return Some((row + 1, 1));
        }
    }
    None
}

fn collect_line_starts(node: TsNode<'_>, starts: &mut Vec<(usize, usize)>) {
    let opens_lines = matches!(node.kind(), "module" | "block" | "decorated_definition");
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.is_extra() {
            continue;
        }
        if (opens_lines && child.is_named()) || LINE_START_KINDS.contains(&child.kind()) {
            starts.push((child.start_byte(), child.start_position().row));
        }
        collect_line_starts(child, starts);
    }
}

/// Width of `indent` with tabs stopping every 8 columns, and with tabs
/// counted as one column. A form feed resets both.
fn indent_columns(indent: &str) -> (usize, usize) {
    let (mut col, mut alt) = (0, 0);
    for c in indent.chars() {
        match c {
            '\t' => {
                col = (col / 8 + 1) * 8;
                alt += 1;
            }
            '\x0c' => {
                col = 0;
                alt = 0;
            }
            _ => {
                col += 1;
                alt += 1;
            }
        }
    }
    (col, alt)
}

// ============================================================================
// Tests
// ============================================================================
