//! Chat-completion backend.
//!
//! Agents talk to models through [`ChatBackend`]; [`OpenRouterClient`] is
//! the HTTP implementation against an OpenAI-compatible endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::DebateConfig;

/// Sampling temperature sent with every completion request.
pub const TEMPERATURE: f64 = 0.7;

/// Errors from chat-completion calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Anything that turns a chat transcript into completion text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Complete `messages` with `model`, returning the reply text.
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// OpenRouter (or any OpenAI-compatible) chat completions client.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl OpenRouterClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &DebateConfig) -> Result<Self, LlmError> {
        Self::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.http_timeout,
        )
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let start = Instant::now();

        let request_body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": TEMPERATURE
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let resp_json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let content = extract_completion_text(&resp_json);
        debug!(
            model,
            chars = content.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(content)
    }
}

/// Pull the reply text out of a completion response.
///
/// Accepts OpenAI-style `choices`, Responses-style `output`, and a few
/// bare string keys. Falls back to the serialized body so callers always
/// get something to inspect.
pub fn extract_completion_text(data: &Value) -> String {
    let choice = &data["choices"][0];
    let output = &data["output"][0];

    let candidates = [&choice["message"]["content"], &choice["text"]]
        .into_iter()
        .chain(
            output["content"]
                .as_array()
                .into_iter()
                .flatten()
                .map(|part| &part["text"]),
        )
        .chain([
            &output["text"],
            &data["output_text"],
            &data["result"],
            &data["message"],
            &data["response"],
            &data["text"],
        ]);

    candidates
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}
