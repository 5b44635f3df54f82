//! LLM access for the draftsmith platform.
//!
//! This crate provides:
//!
//! - **Backend abstraction**: the [`LlmBackend`] trait, whose
//!   implementations push incremental output into a channel
//! - **OpenAI-compatible backend**: streaming chat completions over SSE
//! - **SSE parsing**: an incremental parser for event-stream bodies

pub mod backend;
pub mod error;
pub mod openai;
pub mod sse;

pub use backend::{LlmBackend, LlmBackendConfig, LlmMessage, LlmProvider, LlmRequest, MessageRole, StreamEvent};
pub use error::LlmError;
pub use openai::OpenAiBackend;
