// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Python support for commentator.
//!
//! This crate holds everything that needs to understand Python syntax:
//! - [`cst`]: lossless, editable syntax trees over tree-sitter-python
//! - [`locate`]: finding top-level functions by name
//! - [`normalize`]: erasing documentation and annotations
//! - [`equivalence`]: structural comparison and completeness checks
//! - [`splice`]: merging a rewritten function back into its file

pub mod cst;
pub mod docstring;
pub mod equivalence;
pub mod locate;
pub mod normalize;
pub mod params;
pub mod splice;

pub use cst::{parse, ParseError, SyntaxTree};
pub use equivalence::{
    annotation_error, check_candidate, gained_typing, has_documentation, is_fully_typed,
    structurally_equal, Rejection,
};
pub use locate::{enumerate, extract_source, find, FunctionDef, FunctionKind, LocateError};
pub use splice::{replace_function, SpliceError};
