//! Conversation state for the draftsmith platform.
//!
//! This crate provides:
//!
//! - **Chat turns**: role-tagged messages exchanged with the caller
//! - **Memory store**: keyed values with turn-scoped lifespans
//! - **Session context**: per-session conversational state and its
//!   prompt snapshot
//! - **Context registry**: per-service store of live session contexts
//! - **Payload classification**: tagged parse of workflow-execution
//!   payloads embedded in user turns

pub mod context;
pub mod memory;
pub mod payload;
pub mod registry;
pub mod turn;

pub use context::{ContextSnapshot, SessionContext, WorkflowState};
pub use memory::{Lifespan, MemoryEntry, MemoryStore};
pub use payload::{ParsedTurn, WorkflowExecutionPayload};
pub use registry::ContextRegistry;
pub use turn::{ChatTurn, TurnRole};
