//! Recording rejected generation attempts.
//!
//! The annotation loop reports every rejection through a [`DiagnosticSink`].
//! The binary fans out to a [`TracingSink`] for the console and a
//! [`LogFileSink`] that keeps the offending candidates for later reading.
//! Tests use a [`MemorySink`].

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// What went wrong with one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The candidate is not valid Python.
    ParseFailure,
    /// The candidate changes code beyond documentation and annotations.
    ValidationFailure,
    /// The candidate leaves a parameter or the return value unannotated.
    MissingTypes,
    /// The candidate does not define the function being annotated.
    MissingFunction,
    /// Splicing the candidate into the file failed or produced invalid code.
    SpliceRejected,
    /// The generation backend failed in a way worth retrying.
    BackendUnavailable,
    /// The file's language cannot be validated, so it was skipped.
    UnsupportedLanguage,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::ParseFailure => "Parse failure",
            FailureKind::ValidationFailure => "Validation failure",
            FailureKind::MissingTypes => "Failed to add types",
            FailureKind::MissingFunction => "Function missing from candidate",
            FailureKind::SpliceRejected => "Splice rejected",
            FailureKind::BackendUnavailable => "Backend unavailable",
            FailureKind::UnsupportedLanguage => "Unsupported language",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a failure happened and what was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureContext {
    pub file: String,
    /// Empty for file-level failures.
    pub function: String,
    /// 1-based attempt number, 0 for file-level failures.
    pub attempt: u32,
    pub detail: String,
    /// The rejected candidate text, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
}

impl FailureContext {
    pub fn new(file: impl Into<String>, function: impl Into<String>, attempt: u32) -> Self {
        FailureContext {
            file: file.into(),
            function: function.into(),
            attempt,
            detail: String::new(),
            candidate: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_candidate(mut self, candidate: impl Into<String>) -> Self {
        self.candidate = Some(candidate.into());
        self
    }
}

/// Receiver for rejected attempts.
pub trait DiagnosticSink {
    fn record_failure(&mut self, kind: FailureKind, context: &FailureContext);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn record_failure(&mut self, kind: FailureKind, context: &FailureContext) {
        (**self).record_failure(kind, context);
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Emits each failure as a `tracing` warning.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record_failure(&mut self, kind: FailureKind, context: &FailureContext) {
        warn!(
            file = %context.file,
            function = %context.function,
            attempt = context.attempt,
            detail = %context.detail,
            "{}",
            kind
        );
    }
}

/// Appends timestamped entries, candidate text included, to a log file.
#[derive(Debug)]
pub struct LogFileSink {
    path: PathBuf,
    file: File,
}

impl LogFileSink {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(LogFileSink {
            path: path.to_path_buf(),
            file,
        })
    }

    fn write_entry(&mut self, kind: FailureKind, context: &FailureContext) -> io::Result<()> {
        let mut entry = format!(
            "{} commentator ERROR {}: {}",
            format_timestamp(SystemTime::now()),
            kind,
            context.file
        );
        if !context.function.is_empty() {
            entry.push_str(&format!("::{} (attempt {})", context.function, context.attempt));
        }
        if !context.detail.is_empty() {
            entry.push_str(&format!(": {}", context.detail));
        }
        entry.push('\n');
        if let Some(candidate) = &context.candidate {
            entry.push_str(candidate);
            if !candidate.ends_with('\n') {
                entry.push('\n');
            }
        }
        self.file.write_all(entry.as_bytes())?;
        self.file.flush()
    }
}

impl DiagnosticSink for LogFileSink {
    fn record_failure(&mut self, kind: FailureKind, context: &FailureContext) {
        if let Err(err) = self.write_entry(kind, context) {
            warn!(path = %self.path.display(), error = %err, "failed to write diagnostic log");
        }
    }
}

/// Keeps every failure in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub failures: Vec<(FailureKind, FailureContext)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<FailureKind> {
        self.failures.iter().map(|(kind, _)| *kind).collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn record_failure(&mut self, kind: FailureKind, context: &FailureContext) {
        self.failures.push((kind, context.clone()));
    }
}

/// Forwards every failure to each of its sinks in turn.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn DiagnosticSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl DiagnosticSink for FanoutSink {
    fn record_failure(&mut self, kind: FailureKind, context: &FailureContext) {
        for sink in &mut self.sinks {
            sink.record_failure(kind, context);
        }
    }
}

fn format_timestamp(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
