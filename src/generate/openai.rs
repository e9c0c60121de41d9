//! Chat-completions client for OpenAI-compatible APIs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use commentator_core::config::GenerationConfig;

use super::prompt::{system_message, user_message};
use super::{GenerationError, GenerationRequest, GenerationResult, Generator};

/// Shown when the backend refuses our credentials.
const API_KEY_HELP: &str = "You need an OpenAI key to use commentator. \
You can get a key here: https://openai.com/api/ \
Invoke commentator with --api-key or set the environment variable OPENAI_API_KEY.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Blocking client for `POST {api_base}/chat/completions`.
pub struct OpenAiGenerator {
    agent: ureq::Agent,
    api_key: Option<String>,
    model: String,
    endpoint: String,
    temperature: Option<f64>,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig, api_key: Option<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        OpenAiGenerator {
            agent,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            temperature: config.temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Sort an HTTP error status into fatal and retryable.
pub fn classify_status(status: u16) -> GenerationError {
    match status {
        401 | 403 => GenerationError::Fatal(format!(
            "the generation service rejected the API key (HTTP {}). {}",
            status, API_KEY_HELP
        )),
        400 | 404 => GenerationError::Fatal(format!(
            "the generation service rejected the request (HTTP {}); check the model name and api_base in the configuration",
            status
        )),
        _ => GenerationError::Recoverable(format!("generation service returned HTTP {}", status)),
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> GenerationResult<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerationError::Fatal(API_KEY_HELP.to_string()));
        };

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_message(request),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_message(request),
                },
            ],
            temperature: self.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "requesting completion");
        let result = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .send_json(&body);

        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(status)) => return Err(classify_status(status)),
            Err(err) => {
                return Err(GenerationError::Recoverable(format!(
                    "request to {} failed: {}",
                    self.endpoint, err
                )))
            }
        };

        let parsed: ChatResponse = response.body_mut().read_json().map_err(|err| {
            GenerationError::Recoverable(format!("malformed completion response: {}", err))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Recoverable("completion had no choices".to_string()))
    }
}
