//! Domain error types for server operations.

use std::fmt;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment configuration could not be loaded or parsed.
    LoadFailed { reason: String },
    /// The hosted OpenAI API was configured without an API key.
    MissingApiKey { base_url: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadFailed { reason } => {
                write!(f, "failed to load configuration: {reason}")
            }
            Self::MissingApiKey { base_url } => {
                write!(f, "no API key configured for {base_url}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
