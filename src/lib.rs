//! Commentator: documentation and type annotations for Python functions,
//! with a guarantee that the code itself never changes.
//!
//! Each top-level function is sent to a text-generation service; the
//! rewrite is accepted only if it is structurally identical to the
//! original once docstrings and annotations are erased, and if it
//! annotates every parameter and the return value.
//!
//! ## Modules
//!
//! - `annotate` - the per-function retry loop
//! - `generate` - the generation backend seam, HTTP client, prompt and
//!   response unwrapping
//! - `files` - input file discovery
//! - `cli` - the command-line front door

// Core infrastructure - re-exported from commentator-core
pub use commentator_core::config;
pub use commentator_core::diagnostics;
pub use commentator_core::diff;
pub use commentator_core::error;
pub use commentator_core::language;
pub use commentator_core::output;

pub mod annotate;
pub mod cli;
pub mod files;
pub mod generate;

// Error bridges - converts module errors to CommentatorError
mod error_bridges;

pub use commentator_core::error::{CommentatorError, OutputErrorCode};
pub use commentator_python;
