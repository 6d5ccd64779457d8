// src/llm/openai.rs

//! OpenAI-compatible chat completions over a blocking `reqwest` client.

use super::{estimate_tokens, GenerationRequest, ModelRegistry, TextGenerator};
use crate::errors::{Error, Result};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sends prompts to whichever OpenAI-compatible server the selector names.
///
/// The client is shared by all analysis workers; `reqwest::blocking::Client`
/// is internally reference counted and safe to use from several threads.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: Client,
    models: ModelRegistry,
    log_token_estimates: bool,
}

impl OpenAiBackend {
    /// Builds the backend with a per-request timeout.
    ///
    /// # Errors
    /// `Error::Config` if the HTTP client cannot be constructed.
    pub fn new(models: ModelRegistry, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            models,
            log_token_estimates: false,
        })
    }

    /// Logs a rough input/output token count after each call.
    pub fn with_token_estimates(mut self, enabled: bool) -> Self {
        self.log_token_estimates = enabled;
        self
    }

    fn chat_url(base_url: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }
}

impl TextGenerator for OpenAiBackend {
    fn validate_model(&self, model: &str) -> Result<()> {
        self.models.resolve(model)?.api_key().map(|_| ())
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
        let spec = self.models.resolve(request.model)?;
        let api_key = spec.api_key()?;
        log::info!("Calling LLM: {} ({})", request.model, spec.model);

        let body = ChatRequest {
            model: &spec.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_role,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: spec.send_temperature.then_some(request.temperature),
        };

        let mut http = self
            .client
            .post(Self::chat_url(&spec.base_url))
            .header(CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(key) = api_key {
            http = http.header(AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = http
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                log::error!("LLM call failed: {}", e);
                Error::Llm(e.to_string())
            })?;
        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::Llm(format!("unexpected response body: {e}")))?;

        let output = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if self.log_token_estimates {
            log::info!(
                "Token consumption - input: {}, output: {}",
                estimate_tokens(request.system_role) + estimate_tokens(request.prompt),
                estimate_tokens(&output)
            );
        }
        Ok(output)
    }
}
