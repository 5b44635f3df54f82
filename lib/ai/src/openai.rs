//! OpenAI-compatible streaming backend.
//!
//! Speaks the `/chat/completions` wire format with `stream: true`,
//! which covers OpenAI itself and the many compatible servers.

use crate::backend::{LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, MessageRole, StreamEvent};
use crate::error::LlmError;
use crate::sse::SseParser;
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tokio::sync::mpsc;
use tracing::debug;

/// Streaming client for OpenAI-compatible chat-completion APIs.
pub struct OpenAiBackend {
    config: LlmBackendConfig,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Creates a backend from a configuration.
    #[must_use]
    pub fn new(config: LlmBackendConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Builds the chat-completions request body.
    fn request_body(&self, request: &LlmRequest) -> JsonValue {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        for message in &request.messages {
            let role = match message.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            messages.push(json!({"role": role, "content": message.content}));
        }

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": true,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn stream(
        &self,
        request: &LlmRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<(), LlmError> {
        let mut http = self.client.post(self.completions_url());
        if let Some(api_key) = &self.config.api_key {
            http = http.bearer_auth(api_key);
        }

        let response = http
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response.bytes_stream();
        let mut parser = SseParser::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| LlmError::RequestFailed {
                reason: e.to_string(),
            })?;

            for payload in parser.feed(&String::from_utf8_lossy(&chunk)) {
                if payload == "[DONE]" {
                    let _ = events.send(StreamEvent::Done).await;
                    return Ok(());
                }
                let Some(delta) = parse_delta(&payload) else {
                    continue;
                };
                if delta.is_empty() {
                    continue;
                }
                if events.send(StreamEvent::Delta(delta)).await.is_err() {
                    // Consumer hung up; stop pulling from the model.
                    return Ok(());
                }
            }
        }

        let _ = events.send(StreamEvent::Done).await;
        Ok(())
    }

    fn provider(&self) -> LlmProvider {
        self.config.provider.clone()
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Deserialize)]
struct ChunkResponse {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extracts the textual delta from one streamed chunk, if it carries
/// one. Role-only and unparseable chunks yield `None`.
fn parse_delta(payload: &str) -> Option<String> {
    let chunk: ChunkResponse = match serde_json::from_str(payload) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "skipping unparseable stream chunk");
            return None;
        }
    };
    chunk.choices.into_iter().next()?.delta.content
}
