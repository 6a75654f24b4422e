//! Chat backend for the analyst panel.
//!
//! [`ChatBackend`] is the seam between producers and the model
//! endpoint; [`LlmClient`] implements it against an Ollama-compatible
//! `/api/chat` API. Tests substitute their own backends.

use crate::producer::ProducerError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// One chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the endpoint for structured JSON output.
    pub json_output: bool,
}

/// Anything that can answer one chat completion.
///
/// In-flight calls must stop when the returned future is dropped; the
/// coordinator relies on this to cancel abandoned work at the group
/// deadline.
pub trait ChatBackend: Send + Sync {
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, ProducerError>> + Send;
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for an Ollama-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http_client: reqwest::Client,
    api_url: String,
    model: String,
    timeout_seconds: u64,
}

impl LlmClient {
    /// Create a client with a per-call timeout.
    pub fn new(api_url: &str, model: &str, timeout_seconds: u64) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout_seconds,
        }
    }

    #[allow(dead_code)] // Utility accessor
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, ProducerError> {
        let url = format!("{}/api/chat", self.api_url);

        let body = OllamaChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.user_prompt.clone(),
                },
            ],
            stream: false,
            format: request.json_output.then(|| "json".to_string()),
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!("Sending chat request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProducerError::Timeout {
                        seconds: self.timeout_seconds,
                    }
                } else if e.is_connect() {
                    ProducerError::Connect {
                        url: self.api_url.clone(),
                    }
                } else {
                    ProducerError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProducerError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ProducerError::Request(format!("failed to parse chat response: {e}")))?;

        Ok(chat_response.message.content)
    }
}

impl ChatBackend for LlmClient {
    fn chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, ProducerError>> + Send {
        self.send(request)
    }
}
