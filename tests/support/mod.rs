//! Shared test support for annotation runs.
//!
//! [`ScriptedGenerator`] replays canned responses in order and records every
//! request it receives, so tests can assert both what was accepted and how
//! many times the backend was asked.

use std::collections::VecDeque;

use commentator::generate::{GenerationError, GenerationRequest, GenerationResult, Generator};

#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: VecDeque<GenerationResult<String>>,
    pub requests: Vec<GenerationRequest>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response, returned as raw backend text.
    pub fn then_reply(mut self, text: impl Into<String>) -> Self {
        self.responses.push_back(Ok(text.into()));
        self
    }

    /// Queue the same reply `times` times.
    pub fn then_reply_n(mut self, text: &str, times: usize) -> Self {
        for _ in 0..times {
            self.responses.push_back(Ok(text.to_string()));
        }
        self
    }

    pub fn then_fail(mut self, err: GenerationError) -> Self {
        self.responses.push_back(Err(err));
        self
    }

    /// Requests made so far, by function fragment.
    pub fn request_count(&self) -> usize {
        self.requests.len()
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> GenerationResult<String> {
        self.requests.push(request.clone());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Recoverable("script exhausted".to_string())))
    }
}

/// Wrap `code` in a fenced block the way chat backends reply.
pub fn fenced(code: &str) -> String {
    format!("```python\n{}```", code)
}
