//! Per-session conversational state.
//!
//! A [`SessionContext`] aggregates the memory store, free-form user/NLP
//! slots, and the workflow-execution slots, and serializes to the
//! structured snapshot embedded in every prompt. Contexts are owned by
//! the [`ContextRegistry`](crate::registry::ContextRegistry) and live
//! until process teardown.

use crate::memory::{Lifespan, MemoryStore};
use crate::payload::WorkflowExecutionPayload;
use chrono::{DateTime, Utc};
use draftsmith_core::SessionId;
use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_json::map::Map as JsonMap;

/// In-progress workflow execution state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkflowState {
    /// Form data accumulated so far.
    pub form_data: JsonMap<String, JsonValue>,
    /// Zero-based index of the step being executed.
    pub current_step: i64,
    /// The record under execution, if any.
    pub record_id: Option<JsonValue>,
}

/// Conversational state for one session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The session this context belongs to.
    pub session_id: SessionId,
    /// Number of turn-batches processed so far.
    pub message_count: u64,
    /// Turn-scoped memory.
    pub memory: MemoryStore,
    /// Free-form user slots.
    pub user: JsonMap<String, JsonValue>,
    /// Free-form NLP slots.
    pub nlp: JsonMap<String, JsonValue>,
    /// The record currently being worked on.
    pub current_record: JsonMap<String, JsonValue>,
    /// The workflow currently being executed.
    pub current_workflow: JsonMap<String, JsonValue>,
    /// Workflow step state.
    pub workflow_state: WorkflowState,
    /// When the context was created.
    pub created_at: DateTime<Utc>,
    /// When the context last processed a turn.
    pub last_active_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates a fresh context for a session.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            message_count: 0,
            memory: MemoryStore::new(),
            user: JsonMap::new(),
            nlp: JsonMap::new(),
            current_record: JsonMap::new(),
            current_workflow: JsonMap::new(),
            workflow_state: WorkflowState::default(),
            created_at: now,
            last_active_at: now,
        }
    }

    /// Starts processing a new turn-batch.
    ///
    /// Increments the message count by exactly one, then expires memory.
    /// Called exactly once per inbound batch, before prompt assembly.
    pub fn begin_turn(&mut self) {
        self.message_count += 1;
        self.memory.cleanup_expired();
        self.last_active_at = Utc::now();
    }

    /// Inserts or overwrites a memory entry.
    ///
    /// A lifespan of `1` (the usual default) keeps the entry visible
    /// through the next turn; `0` keeps it for the whole session.
    pub fn update_memory(&mut self, key: impl Into<String>, value: JsonValue, lifespan: i64) {
        self.memory.insert(key, value, Lifespan::from_turns(lifespan));
    }

    /// Merges a workflow-execution payload into this context.
    pub fn apply_workflow_execution(&mut self, payload: &WorkflowExecutionPayload) {
        self.current_workflow = payload.workflow.clone();
        self.current_record = payload.record_data.clone();
        self.workflow_state = WorkflowState {
            form_data: payload.form_data.clone(),
            current_step: payload.current_step,
            record_id: payload.record_id.clone(),
        };
    }

    /// Returns the structured view embedded in the prompt.
    ///
    /// Nothing is summarized or truncated; snapshot size grows with
    /// session longevity.
    #[must_use]
    pub fn to_snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            session: SessionInfo {
                id: self.session_id.clone(),
                message_count: self.message_count,
            },
            memory: self.memory.to_snapshot(),
            user: self.user.clone(),
            nlp: self.nlp.clone(),
            current_record: self.current_record.clone(),
            current_workflow: self.current_workflow.clone(),
            workflow_state: self.workflow_state.clone(),
        }
    }
}

/// Session identity as rendered in the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// The session identifier.
    pub id: SessionId,
    /// Turn-batches processed so far.
    pub message_count: u64,
}

/// The serializable view of a session context used for prompting.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    /// Session identity.
    pub session: SessionInfo,
    /// Live memory entries.
    pub memory: JsonValue,
    /// Free-form user slots.
    pub user: JsonMap<String, JsonValue>,
    /// Free-form NLP slots.
    pub nlp: JsonMap<String, JsonValue>,
    /// The record currently being worked on.
    pub current_record: JsonMap<String, JsonValue>,
    /// The workflow currently being executed.
    pub current_workflow: JsonMap<String, JsonValue>,
    /// Workflow step state.
    pub workflow_state: WorkflowState,
}
