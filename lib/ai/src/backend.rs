//! LLM backend abstraction.
//!
//! Provides a unified interface for LLM providers. Backends stream:
//! each incremental output event is pushed into a channel supplied by
//! the caller, and the caller drains the receiving end. Dropping the
//! receiver cancels the stream; the backend observes the closed channel
//! on its next send and stops.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Available LLM providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    /// OpenAI API.
    OpenAi,
    /// Generic OpenAI-compatible API.
    OpenAiCompatible,
}

/// Configuration for an LLM backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmBackendConfig {
    /// The provider type.
    pub provider: LlmProvider,
    /// Base URL for the API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key (if required).
    pub api_key: Option<String>,
    /// Additional provider-specific options.
    pub options: HashMap<String, JsonValue>,
}

impl LlmBackendConfig {
    /// Creates an OpenAI backend configuration.
    #[must_use]
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            api_key: Some(api_key.into()),
            options: HashMap::new(),
        }
    }

    /// Creates a configuration for an OpenAI-compatible API.
    #[must_use]
    pub fn openai_compatible(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::OpenAiCompatible,
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            options: HashMap::new(),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// A request to an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// System instruction, if any.
    pub system: Option<String>,
    /// The conversation to complete, in order.
    pub messages: Vec<LlmMessage>,
    /// Temperature for sampling (0.0 - 1.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Creates a new request for the given conversation.
    #[must_use]
    pub fn new(messages: Vec<LlmMessage>) -> Self {
        Self {
            system: None,
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Adds a system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the max tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
}

impl LlmMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User/human message.
    User,
    /// Assistant/AI message.
    Assistant,
    /// System message.
    System,
}

/// One incremental event from a model stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A textual delta to forward to the caller.
    Delta(String),
    /// The model signalled completion.
    Done,
}

/// Trait for streaming LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generates a streamed response for the given request.
    ///
    /// Events are pushed into `events` in model order. The call returns
    /// once the model signals completion, the consumer hangs up, or the
    /// request fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be submitted or the
    /// stream fails mid-flight. A consumer hang-up is not an error.
    async fn stream(
        &self,
        request: &LlmRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> Result<(), LlmError>;

    /// Returns the provider type.
    fn provider(&self) -> LlmProvider;

    /// Returns the model name.
    fn model(&self) -> &str;
}
