//! Error bridge implementations for root-crate error types.
//!
//! `From` conversions into the unified `CommentatorError`. They live here
//! rather than in `commentator-core` because the source types belong to the
//! root crate.

use commentator_core::error::CommentatorError;

use crate::annotate::AnnotateError;
use crate::files::FileError;
use crate::generate::GenerationError;

// ============================================================================
// Bridge: AnnotateError -> CommentatorError
// ============================================================================

impl From<AnnotateError> for CommentatorError {
    fn from(err: AnnotateError) -> Self {
        match err {
            AnnotateError::Fatal(message) => CommentatorError::BackendFatal { message },
            AnnotateError::Parse { file, source } => CommentatorError::ApplyError {
                message: format!("not valid Python: {}", source),
                file: Some(file),
            },
            AnnotateError::Locate { file, name } => CommentatorError::FunctionNotFound { file, name },
            err @ AnnotateError::UnsupportedLanguage { .. } => CommentatorError::InvalidArguments {
                message: err.to_string(),
            },
        }
    }
}

// ============================================================================
// Bridge: FileError -> CommentatorError
// ============================================================================

impl From<FileError> for CommentatorError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound { path } => CommentatorError::FileNotFound { path },
            FileError::Io(e) => CommentatorError::ApplyError {
                message: e.to_string(),
                file: None,
            },
        }
    }
}

// ============================================================================
// Bridge: GenerationError -> CommentatorError
// ============================================================================

impl From<GenerationError> for CommentatorError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Fatal(message) => CommentatorError::BackendFatal { message },
            // Recoverable failures are retried inside the loop; one that
            // escapes it is still a backend problem.
            err @ GenerationError::Recoverable(_) => CommentatorError::BackendFatal {
                message: err.to_string(),
            },
        }
    }
}
