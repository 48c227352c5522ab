//! Model access for sandboxed plugins.
//!
//! Built fresh for every execution from the caller's resolved config, so one
//! user's credentials never outlive their own call. Blocking on purpose: the
//! sandbox runs on a dedicated blocking thread and QuickJS host functions
//! cannot await.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Per-call chat-completion client exposed to scripts as `model.complete`.
#[derive(Debug, Clone)]
pub struct ModelClient {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl ModelClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build model HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Single-turn completion. `options` may override `model`, `max_tokens`,
    /// and `temperature`.
    pub fn complete(&self, prompt: &str, options: Option<&Value>) -> Result<String> {
        let model = options
            .and_then(|o| o.get("model"))
            .and_then(Value::as_str)
            .unwrap_or(&self.model)
            .to_string();
        let max_tokens = options
            .and_then(|o| o.get("max_tokens"))
            .and_then(Value::as_u64)
            .map(|n| n as u32);
        let temperature = options
            .and_then(|o| o.get("temperature"))
            .and_then(Value::as_f64)
            .map(|t| t as f32);

        let body = ChatRequest {
            model: model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            temperature,
        };

        debug!(model = %model, "Sending model request from sandbox");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .context("Model HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().unwrap_or_default();
            anyhow::bail!("model API returned {}: {}", status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .context("Failed to parse model response")?;

        Ok(chat_response
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}
