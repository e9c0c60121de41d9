//! Candidate generation.
//!
//! The annotation loop asks a [`Generator`] for a rewritten version of one
//! function at a time. [`OpenAiGenerator`] talks to a chat-completions API;
//! tests substitute scripted generators.

pub mod openai;
pub mod prompt;
pub mod unwrap;

use thiserror::Error;

pub use openai::OpenAiGenerator;
pub use unwrap::extract_code_block;

/// One request for a rewritten function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Programming language label (`"Python"`), empty if unknown.
    pub language: String,
    /// Extra instruction about translating documentation, empty if none.
    pub translation: String,
    /// Source of the function to rewrite.
    pub fragment: String,
}

impl GenerationRequest {
    pub fn new(
        language: impl Into<String>,
        translation: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        GenerationRequest {
            language: language.into(),
            translation: translation.into(),
            fragment: fragment.into(),
        }
    }
}

/// Error from a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Transient failure; the attempt counts and the loop moves on.
    #[error("generation failed: {0}")]
    Recoverable(String),

    /// The backend will keep refusing (bad key, bad model); the run stops.
    #[error("{0}")]
    Fatal(String),
}

impl GenerationError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, GenerationError::Fatal(_))
    }
}

/// Result type for generation.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Source of candidate rewrites.
pub trait Generator {
    /// Produce raw response text for `request`. The text may wrap the code
    /// in a fenced block.
    fn generate(&mut self, request: &GenerationRequest) -> GenerationResult<String>;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&mut self, request: &GenerationRequest) -> GenerationResult<String> {
        (**self).generate(request)
    }
}
