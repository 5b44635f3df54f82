//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.

use crate::error::ConfigError;
use draftsmith_ai::{LlmBackendConfig, LlmProvider};
use draftsmith_core::Result;
use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket server listens on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// LLM backend settings.
    #[serde(default)]
    pub llm: LlmSettings,
}

/// LLM backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// Base URL of the chat-completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key, required for the hosted OpenAI API.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
        }
    }
}

impl LlmSettings {
    /// Builds the backend configuration for these settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings name the hosted OpenAI API but
    /// no API key is configured.
    pub fn backend_config(&self) -> Result<LlmBackendConfig, ConfigError> {
        let hosted = self.base_url.contains("api.openai.com");
        if hosted && self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                base_url: self.base_url.clone(),
            }
            .into());
        }

        let config = if hosted {
            let api_key = self.api_key.clone().unwrap_or_default();
            let mut config = LlmBackendConfig::openai(api_key, self.model.clone());
            config.base_url = self.base_url.clone();
            config
        } else {
            let mut config =
                LlmBackendConfig::openai_compatible(self.base_url.clone(), self.model.clone());
            if let Some(api_key) = &self.api_key {
                config = config.with_api_key(api_key.clone());
            }
            config
        };

        Ok(config)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ConfigError::LoadFailed {
                reason: e.to_string(),
            })?;
        Ok(settings)
    }
}
