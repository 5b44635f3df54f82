//! Core domain types and utilities for the draftsmith platform.
//!
//! This crate provides the foundational identifier types and error
//! handling shared by the draftsmith conversational schema-drafting
//! assistant.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ExchangeId, SessionId};
