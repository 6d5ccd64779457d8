//! The text-generation backend contract and model selection.
//!
//! Stages only see [`TextGenerator`]. The shipped implementation,
//! [`OpenAiBackend`], talks to any OpenAI-compatible chat completions
//! endpoint; which endpoint is used depends on the model selector passed with
//! each request, resolved through a [`ModelRegistry`].

mod openai;

pub use openai::OpenAiBackend;

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Everything the backend needs for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    /// Model selector, resolved through the backend's [`ModelRegistry`].
    pub model: &'a str,
    pub temperature: f32,
    /// Persona sent as the system message.
    pub system_role: &'a str,
}

/// Prompt in, completion text out.
pub trait TextGenerator: Send + Sync {
    /// Checks, before any work starts, that `model` can be served.
    ///
    /// # Errors
    /// `Error::UnknownModel` or `Error::Config` (e.g. missing credentials).
    fn validate_model(&self, _model: &str) -> Result<()> {
        Ok(())
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String>;
}

/// How to reach one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Selector key; a request selector matches when it equals this key or
    /// contains it (case-insensitive), so `deepseek-r1` matches `deepseek`.
    pub name: String,
    /// Model id sent to the server.
    pub model: String,
    /// Base URL of the OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,
    /// Environment variable holding the API key. `None` for servers without auth.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Some self-hosted servers reject the `temperature` field.
    #[serde(default = "default_true")]
    pub send_temperature: bool,
}

fn default_true() -> bool {
    true
}

impl ModelSpec {
    /// Reads the API key from the environment.
    ///
    /// # Errors
    /// `Error::Config` if the entry names a variable that is unset or empty.
    pub fn api_key(&self) -> Result<Option<String>> {
        match &self.api_key_env {
            None => Ok(None),
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
                _ => Err(Error::Config(format!(
                    "model '{}' requires an API key in the {} environment variable",
                    self.name, var
                ))),
            },
        }
    }
}

/// The table of known models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelSpec>) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    /// Adds or replaces a model by name.
    pub fn upsert(&mut self, spec: ModelSpec) {
        match self.models.iter_mut().find(|m| m.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.models.push(spec),
        }
    }

    /// Finds the model entry for a selector: exact name first, then substring.
    ///
    /// # Errors
    /// `Error::UnknownModel` when nothing matches.
    pub fn resolve(&self, selector: &str) -> Result<&ModelSpec> {
        let wanted = selector.to_lowercase();
        self.models
            .iter()
            .find(|m| m.name.to_lowercase() == wanted)
            .or_else(|| {
                self.models
                    .iter()
                    .find(|m| wanted.contains(&m.name.to_lowercase()))
            })
            .ok_or_else(|| Error::UnknownModel(selector.to_string()))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(vec![
            ModelSpec {
                name: "qwen".to_string(),
                model: "qwen2.5-coder-32b-instruct".to_string(),
                base_url: "http://localhost:8000/v1".to_string(),
                api_key_env: None,
                send_temperature: false,
            },
            ModelSpec {
                name: "deepseek".to_string(),
                model: "deepseek-r1".to_string(),
                base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
                api_key_env: Some("DEEPSEEK_API_KEY".to_string()),
                send_temperature: true,
            },
        ])
    }
}

/// Rough whitespace token estimate, used for cost logging only.
pub(crate) fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}
