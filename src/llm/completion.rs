//! Completion endpoint client (OpenRouter-style `/completions`).

use crate::config::CompletionConfig;
use crate::error::{CompletionError, Result};
use crate::llm::{Completer, sanitize};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub const MAX_TOKENS: u32 = 60;
pub const TEMPERATURE: f64 = 1.2;
pub const TOP_P: f64 = 0.8;
pub const FREQUENCY_PENALTY: f64 = 0.7;
pub const PRESENCE_PENALTY: f64 = 0.9;

pub const MALFORMED_PAYLOAD_REPLY: &str =
    "I'm here, but I encountered an issue generating a response.";
pub const STATUS_REPLY: &str = "Unable to generate a response.";
pub const TRANSPORT_REPLY: &str = "Sorry, I'm experiencing technical issues.";

/// Request body for one completion call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
}

impl<'a> CompletionRequest<'a> {
    /// Build a request with the fixed sampling parameters.
    pub fn new(model: &'a str, prompt: &'a str) -> Self {
        Self {
            model,
            prompt,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            frequency_penalty: FREQUENCY_PENALTY,
            presence_penalty: PRESENCE_PENALTY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub text: Option<String>,
}

impl CompletionError {
    /// The reply shown to chat users for this failure class.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            CompletionError::MalformedPayload(_) => MALFORMED_PAYLOAD_REPLY,
            CompletionError::Status { .. } => STATUS_REPLY,
            CompletionError::Transport(_) => TRANSPORT_REPLY,
        }
    }
}

/// HTTP client bound to one completion endpoint and model.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one completion request and return the raw first choice text.
    pub async fn request(&self, prompt: &str) -> std::result::Result<String, CompletionError> {
        let body = CompletionRequest::new(&self.model, prompt);

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| CompletionError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|error| CompletionError::Transport(format!("failed to read body: {error}")))?;

        extract_text(&response_text)
    }
}

impl Completer for CompletionClient {
    async fn complete(&self, prompt: &str) -> String {
        match self.request(prompt).await {
            Ok(text) => sanitize(text.trim()),
            Err(error) => {
                tracing::warn!(model = %self.model, %error, "completion failed, using fallback reply");
                error.fallback_reply().to_string()
            }
        }
    }
}

fn extract_text(body: &str) -> std::result::Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|error| CompletionError::MalformedPayload(format!("invalid JSON: {error}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.text)
        .ok_or_else(|| CompletionError::MalformedPayload("no choices[0].text in response".into()))
}
