//! Error types and exit codes for commentator.
//!
//! Each subsystem defines its own `thiserror` enum. At the front door they are
//! all bridged into [`CommentatorError`], which carries enough context for a
//! one-line message or a JSON error response.
//!
//! ## Exit Codes
//!
//! - `2`: Invalid arguments (bad flags, unreadable config)
//! - `3`: Resolution errors (file or function not found)
//! - `4`: Apply errors (failed to read or write a file)
//! - `6`: Generation backend refused the request (bad key, unknown model)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes used as process exit codes and in JSON error output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    InvalidArguments = 2,
    ResolutionError = 3,
    ApplyError = 4,
    BackendFatal = 6,
    InternalError = 10,
}

impl OutputErrorCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum CommentatorError {
    /// Invalid arguments or configuration from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Input path does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// A function that was enumerated could not be found again.
    #[error("function '{name}' not found in {file}")]
    FunctionNotFound { file: String, name: String },

    /// Failed to read or write a file.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// The generation backend rejected the request outright.
    #[error("generation backend error: {message}")]
    BackendFatal { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&CommentatorError> for OutputErrorCode {
    fn from(err: &CommentatorError) -> Self {
        match err {
            CommentatorError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CommentatorError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            CommentatorError::FunctionNotFound { .. } => OutputErrorCode::ResolutionError,
            CommentatorError::ApplyError { .. } => OutputErrorCode::ApplyError,
            CommentatorError::BackendFatal { .. } => OutputErrorCode::BackendFatal,
            CommentatorError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<CommentatorError> for OutputErrorCode {
    fn from(err: CommentatorError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: ConfigError -> CommentatorError
// ============================================================================

impl From<crate::config::ConfigError> for CommentatorError {
    fn from(err: crate::config::ConfigError) -> Self {
        CommentatorError::InvalidArguments {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl CommentatorError {
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CommentatorError::InvalidArguments {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        CommentatorError::FileNotFound { path: path.into() }
    }

    /// Create an apply error tied to a file.
    pub fn apply(message: impl Into<String>, file: impl Into<String>) -> Self {
        CommentatorError::ApplyError {
            message: message.into(),
            file: Some(file.into()),
        }
    }

    pub fn backend_fatal(message: impl Into<String>) -> Self {
        CommentatorError::BackendFatal {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CommentatorError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
