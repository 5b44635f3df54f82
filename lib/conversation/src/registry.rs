//! Per-service store of live session contexts.
//!
//! The registry replaces a process-global session map with an explicitly
//! owned object injected into the pipeline at construction, so tests can
//! build isolated stores. Entries are created lazily and never removed;
//! growth is bounded only by process lifetime, so a long-running
//! deployment needs an external eviction policy.

use crate::context::SessionContext;
use draftsmith_core::SessionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store of session contexts keyed by session id.
///
/// The outer lock is held only for lookup and insert, so turns for
/// different sessions never block each other. The per-session mutex
/// serializes turns within one session; context mutation is not
/// commutative, and the transport already delivers turns per connection
/// in order.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<SessionContext>>>>,
}

impl ContextRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context for a session, creating it on first use.
    ///
    /// Subsequent calls for the same id return the same shared instance.
    pub async fn get_or_create(&self, session_id: &SessionId) -> Arc<Mutex<SessionContext>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SessionContext::new(session_id.clone()))))
            .clone()
    }

    /// Returns the number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns whether any sessions exist.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn same_session_returns_same_instance() {
        let registry = ContextRegistry::new();
        let id = SessionId::from("s1");

        let first = registry.get_or_create(&id).await;
        first.lock().await.update_memory("k", json!(1), 0);

        let second = registry.get_or_create(&id).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.lock().await.memory.contains("k"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn different_sessions_are_isolated() {
        let registry = ContextRegistry::new();

        let a = registry.get_or_create(&SessionId::from("a")).await;
        let b = registry.get_or_create(&SessionId::from("b")).await;

        a.lock().await.update_memory("k", json!("a-only"), 0);

        assert!(!b.lock().await.memory.contains("k"));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn fresh_context_starts_at_zero() {
        let registry = ContextRegistry::new();
        let ctx = registry.get_or_create(&SessionId::default()).await;
        assert_eq!(ctx.lock().await.message_count, 0);
    }
}
