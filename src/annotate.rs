//! The per-function annotation loop.
//!
//! Each top-level function of a file is resolved on its own, in source
//! order, by a small state machine:
//!
//! ```text
//! Pending ──(already documented and typed)──────────────▶ done, no request
//!    │
//!    ▼
//! Requesting ──(fatal backend error)─────────────────────▶ run aborted
//!    │   ▲
//!    ▼   │ attempts left
//! Validating ──(rejected)──▶ Retry ──(budget spent)─────▶ Exhausted
//!    │
//!    ▼
//! Accepted: spliced into the working tree
//! ```
//!
//! The working tree is owned by the loop. An accepted candidate replaces it
//! wholesale, so the next function is extracted from the updated file.

use thiserror::Error;
use tracing::{debug, info, warn};

use commentator_core::diagnostics::{DiagnosticSink, FailureContext, FailureKind};
use commentator_core::language::{classify, Language};
use commentator_core::output::{FunctionOutcome, FunctionStatus};
use commentator_python::equivalence::{annotation_error, check_candidate};
use commentator_python::locate;
use commentator_python::splice::SpliceError;
use commentator_python::{
    gained_typing, has_documentation, is_fully_typed, parse, replace_function, ParseError,
    Rejection, SyntaxTree,
};

use crate::generate::{extract_code_block, GenerationError, GenerationRequest, Generator};

/// Default number of generation attempts per function.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum AnnotateError {
    /// The generation backend refused outright. Nothing more can succeed.
    #[error("{0}")]
    Fatal(String),

    /// The input file itself is not valid Python.
    #[error("{file} is not valid Python: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseError,
    },

    /// A function that was enumerated could not be found again.
    #[error("function '{name}' not found in {file}")]
    Locate { file: String, name: String },

    /// The file's language has no structural validation.
    #[error("{file}: cannot validate {language} code")]
    UnsupportedLanguage { file: String, language: String },
}

pub type AnnotateResult<T> = Result<T, AnnotateError>;

// ============================================================================
// Options and Results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotateOptions {
    /// Attempts per function, at least 1.
    pub max_attempts: u32,
    /// Translation instruction passed to the generator, empty for none.
    pub translation: String,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        AnnotateOptions {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            translation: String::new(),
        }
    }
}

/// Result of annotating one file's source.
#[derive(Debug, Clone)]
pub struct AnnotatedSource {
    /// The tree after every accepted replacement.
    pub tree: SyntaxTree,
    /// One entry per distinct top-level function, in source order.
    pub outcomes: Vec<FunctionOutcome>,
}

impl AnnotatedSource {
    pub fn text(&self) -> String {
        self.tree.serialize()
    }

    /// Whether any function was replaced.
    pub fn changed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status == FunctionStatus::Accepted)
    }

    pub fn accepted_names(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.status == FunctionStatus::Accepted)
            .map(|o| o.name.as_str())
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Where one function's resolution stands.
#[derive(Debug)]
enum AttemptState {
    Pending,
    Requesting,
    /// Raw generator output awaiting checks.
    Validating(String),
    /// The last attempt was rejected for this reason.
    Retry(FailureKind),
    /// The updated whole-file tree.
    Accepted(SyntaxTree),
    Exhausted,
}

/// Drives the annotation loop for one or more files.
pub struct Annotator<'a> {
    generator: &'a mut dyn Generator,
    sink: &'a mut dyn DiagnosticSink,
    options: AnnotateOptions,
}

impl<'a> Annotator<'a> {
    pub fn new(
        generator: &'a mut dyn Generator,
        sink: &'a mut dyn DiagnosticSink,
        options: AnnotateOptions,
    ) -> Self {
        Annotator {
            generator,
            sink,
            options,
        }
    }

    /// Annotate every top-level function in `source`.
    ///
    /// `file` names the source for language detection and diagnostics.
    /// Only Python is accepted; anything else is reported to the sink and
    /// returned as [`AnnotateError::UnsupportedLanguage`].
    pub fn annotate_source(&mut self, file: &str, source: &str) -> AnnotateResult<AnnotatedSource> {
        let language = classify(file);
        if language != Language::Python.label() {
            let language = if language.is_empty() { "unknown" } else { language };
            self.sink.record_failure(
                FailureKind::UnsupportedLanguage,
                &FailureContext::new(file, "", 0)
                    .with_detail(format!("{} files are not validated", language)),
            );
            return Err(AnnotateError::UnsupportedLanguage {
                file: file.to_string(),
                language: language.to_string(),
            });
        }

        let mut working = parse(source).map_err(|source| AnnotateError::Parse {
            file: file.to_string(),
            source,
        })?;

        let mut names: Vec<String> = Vec::new();
        for name in locate::enumerate(&working) {
            if names.contains(&name) {
                debug!(file, function = %name, "skipping duplicate definition");
            } else {
                names.push(name);
            }
        }

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let (outcome, updated) = self.resolve_function(file, &working, &name)?;
            if let Some(updated) = updated {
                working = updated;
            }
            outcomes.push(outcome);
        }

        Ok(AnnotatedSource {
            tree: working,
            outcomes,
        })
    }

    /// Run the state machine for function `name` against the current working
    /// tree. Returns the outcome and, if a candidate was accepted, the
    /// updated tree.
    fn resolve_function(
        &mut self,
        file: &str,
        working: &SyntaxTree,
        name: &str,
    ) -> AnnotateResult<(FunctionOutcome, Option<SyntaxTree>)> {
        let not_found = || AnnotateError::Locate {
            file: file.to_string(),
            name: name.to_string(),
        };
        let fragment = locate::extract_source(working, name).map_err(|_| not_found())?;
        let fragment_tree = parse(&fragment).map_err(|source| AnnotateError::Parse {
            file: file.to_string(),
            source,
        })?;
        let request = GenerationRequest::new(
            Language::Python.label(),
            self.options.translation.clone(),
            fragment.clone(),
        );

        let max_attempts = self.options.max_attempts.max(1);
        let mut attempts: u32 = 0;
        let mut state = AttemptState::Pending;

        loop {
            state = match state {
                AttemptState::Pending => {
                    if has_documentation(&fragment) && is_fully_typed(&fragment) {
                        info!(file, function = name, "already has a docstring and types");
                        return Ok((outcome(name, FunctionStatus::AlreadyComplete, 0, false), None));
                    }
                    AttemptState::Requesting
                }

                AttemptState::Requesting => {
                    attempts += 1;
                    debug!(file, function = name, attempt = attempts, "requesting candidate");
                    match self.generator.generate(&request) {
                        Ok(raw) => AttemptState::Validating(raw),
                        Err(GenerationError::Fatal(message)) => {
                            return Err(AnnotateError::Fatal(message));
                        }
                        Err(err @ GenerationError::Recoverable(_)) => {
                            self.record(
                                FailureKind::BackendUnavailable,
                                FailureContext::new(file, name, attempts).with_detail(err.to_string()),
                            );
                            AttemptState::Retry(FailureKind::BackendUnavailable)
                        }
                    }
                }

                AttemptState::Validating(raw) => {
                    let candidate = extract_code_block(&raw);
                    let context = FailureContext::new(file, name, attempts);
                    match check_candidate(&fragment_tree, name, &candidate) {
                        Err(rejection) => {
                            let kind = rejection_kind(&rejection);
                            self.record(
                                kind,
                                context
                                    .with_detail(rejection.to_string())
                                    .with_candidate(candidate),
                            );
                            AttemptState::Retry(kind)
                        }
                        Ok(donor) => match splice_and_verify(working, name, &donor) {
                            Ok(updated) => AttemptState::Accepted(updated),
                            Err(SpliceFailure::HostMissing) => return Err(not_found()),
                            Err(SpliceFailure::Rejected(kind, detail)) => {
                                self.record(
                                    kind,
                                    context.with_detail(detail).with_candidate(candidate),
                                );
                                AttemptState::Retry(kind)
                            }
                        },
                    }
                }

                AttemptState::Retry(kind) => {
                    debug!(file, function = name, attempt = attempts, reason = %kind, "attempt rejected");
                    if attempts >= max_attempts {
                        AttemptState::Exhausted
                    } else {
                        AttemptState::Requesting
                    }
                }

                AttemptState::Accepted(updated) => {
                    let gained = locate::extract_source(&updated, name)
                        .map(|after| gained_typing(&fragment, &after))
                        .unwrap_or(false);
                    info!(file, function = name, attempts, "annotation accepted");
                    return Ok((
                        outcome(name, FunctionStatus::Accepted, attempts, gained),
                        Some(updated),
                    ));
                }

                AttemptState::Exhausted => {
                    warn!(file, function = name, attempts, "giving up; function left unchanged");
                    return Ok((outcome(name, FunctionStatus::Exhausted, attempts, false), None));
                }
            };
        }
    }

    fn record(&mut self, kind: FailureKind, context: FailureContext) {
        self.sink.record_failure(kind, &context);
    }
}

fn outcome(name: &str, status: FunctionStatus, attempts: u32, gained_typing: bool) -> FunctionOutcome {
    FunctionOutcome {
        name: name.to_string(),
        status,
        attempts,
        gained_typing,
    }
}

fn rejection_kind(rejection: &Rejection) -> FailureKind {
    match rejection {
        Rejection::Parse(_) | Rejection::InvalidAnnotation { .. } => FailureKind::ParseFailure,
        Rejection::NotEquivalent => FailureKind::ValidationFailure,
        Rejection::MissingTypes => FailureKind::MissingTypes,
        Rejection::MissingFunction { .. } => FailureKind::MissingFunction,
    }
}

enum SpliceFailure {
    HostMissing,
    Rejected(FailureKind, String),
}

/// Splice `donor` into a copy of `working` and make sure the result still
/// parses.
fn splice_and_verify(
    working: &SyntaxTree,
    name: &str,
    donor: &SyntaxTree,
) -> Result<SyntaxTree, SpliceFailure> {
    let spliced = match replace_function(working.clone(), name, donor) {
        Ok(spliced) => spliced,
        Err(SpliceError::NotFound { .. }) => return Err(SpliceFailure::HostMissing),
        Err(err @ SpliceError::DonorMissing { .. }) => {
            return Err(SpliceFailure::Rejected(FailureKind::MissingFunction, err.to_string()))
        }
    };
    let reparsed = parse(&spliced.serialize()).map_err(|err| {
        SpliceFailure::Rejected(
            FailureKind::SpliceRejected,
            format!("spliced file does not parse: {}", err),
        )
    })?;
    match annotation_error(&reparsed) {
        Some(detail) => Err(SpliceFailure::Rejected(
            FailureKind::SpliceRejected,
            format!("spliced file does not compile: {}", detail),
        )),
        None => Ok(reparsed),
    }
}
