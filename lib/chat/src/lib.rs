//! Chat pipeline for the draftsmith platform.
//!
//! This crate ties the conversation state and the LLM backend together:
//!
//! - **Prompt assembly**: the fixed behavioral instruction, the session
//!   context snapshot, and the caller's turns, in that order
//! - **Chat service**: per-request orchestration — context update,
//!   workflow-payload detection, prompt submission, and ordered delta
//!   forwarding to the caller

pub mod prompt;
pub mod service;

pub use prompt::assemble;
pub use service::{ChatService, StreamChunk};
