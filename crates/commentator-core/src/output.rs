//! JSON output types for CLI responses.
//!
//! Every response starts with `status` and carries `schema_version`. Field
//! order and array order are deterministic for the same input.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CommentatorError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Per-Function and Per-File Outcomes
// ============================================================================

/// How a single function's annotation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionStatus {
    /// A candidate passed every check and was spliced in.
    Accepted,
    /// The function already had documentation and full typing; no request
    /// was made.
    AlreadyComplete,
    /// Every attempt was rejected; the function was left untouched.
    Exhausted,
}

/// Outcome for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionOutcome {
    pub name: String,
    pub status: FunctionStatus,
    /// Generation attempts used.
    pub attempts: u32,
    /// Whether the accepted rewrite added annotations.
    pub gained_typing: bool,
}

/// How a file's processing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// At least one function was accepted and the file was written (or
    /// would be, in a dry run).
    Updated,
    /// Nothing was accepted; the file is as it was.
    Unchanged,
    /// The file was not processed.
    Skipped,
}

/// Outcome for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    /// Language label, empty if unknown.
    pub language: String,
    pub status: FileStatus,
    pub functions: Vec<FunctionOutcome>,
    /// Why the file was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Unified diff of the changes, for dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl FileReport {
    pub fn skipped(
        path: impl Into<String>,
        language: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FileReport {
            path: path.into(),
            language: language.into(),
            status: FileStatus::Skipped,
            functions: Vec::new(),
            reason: Some(reason.into()),
            diff: None,
        }
    }

    fn count(&self, status: FunctionStatus) -> u32 {
        self.functions.iter().filter(|f| f.status == status).count() as u32
    }
}

/// Totals across all files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub files_updated: u32,
    pub files_skipped: u32,
    pub accepted: u32,
    pub already_complete: u32,
    pub exhausted: u32,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for an annotation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationReport {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl AnnotationReport {
    pub fn new(dry_run: bool, files: Vec<FileReport>) -> Self {
        let mut summary = Summary::default();
        for file in &files {
            match file.status {
                FileStatus::Updated => summary.files_updated += 1,
                FileStatus::Skipped => summary.files_skipped += 1,
                FileStatus::Unchanged => {}
            }
            summary.accepted += file.count(FunctionStatus::Accepted);
            summary.already_complete += file.count(FunctionStatus::AlreadyComplete);
            summary.exhausted += file.count(FunctionStatus::Exhausted);
        }
        AnnotationReport {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            dry_run,
            files,
            summary,
        }
    }
}

/// Error information for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code; also the process exit code.
    pub code: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    pub fn from_error(err: &CommentatorError) -> Self {
        let details = match err {
            CommentatorError::FileNotFound { path } => Some(serde_json::json!({ "path": path })),
            CommentatorError::FunctionNotFound { file, name } => {
                Some(serde_json::json!({ "file": file, "function": name }))
            }
            CommentatorError::ApplyError { file, .. } => {
                file.as_ref().map(|f| serde_json::json!({ "file": f }))
            }
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Response for a failed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn from_error(err: &CommentatorError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
