//! The chat pipeline.
//!
//! One call to [`ChatService::handle_chat`] processes one inbound
//! turn-batch: update the session context, detect and merge a
//! workflow-execution payload, assemble the prompt, submit it to the
//! backend, and forward the model's text deltas to the caller in
//! arrival order.

use crate::prompt;
use draftsmith_ai::{LlmBackend, LlmError, StreamEvent};
use draftsmith_conversation::{ChatTurn, ContextRegistry, ParsedTurn, TurnRole, payload};
use draftsmith_core::{ExchangeId, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Buffered events/chunks per in-flight stream.
const CHANNEL_CAPACITY: usize = 32;

/// One caller-visible item of a reply stream: a text delta, or the
/// error that ended the stream.
pub type StreamChunk = Result<String, LlmError>;

/// Orchestrates chat requests against a session registry and a backend.
pub struct ChatService {
    registry: Arc<ContextRegistry>,
    backend: Arc<dyn LlmBackend>,
}

impl ChatService {
    /// Creates a service over an injected registry and backend.
    #[must_use]
    pub fn new(registry: Arc<ContextRegistry>, backend: Arc<dyn LlmBackend>) -> Self {
        Self { registry, backend }
    }

    /// Returns the session registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.registry
    }

    /// Processes one turn-batch and streams the reply.
    ///
    /// Returns a receiver yielding the model's text deltas in arrival
    /// order, one chunk per delta. The channel closes when the model
    /// completes; if the stream fails, the error is the final item, so
    /// the transport can terminate the connection rather than mask the
    /// failure. Dropping the receiver cancels the in-flight stream.
    pub async fn handle_chat(
        &self,
        session_id: SessionId,
        mut turns: Vec<ChatTurn>,
    ) -> mpsc::Receiver<StreamChunk> {
        let exchange = ExchangeId::new();
        debug!(session = %session_id, %exchange, turns = turns.len(), "processing turn-batch");

        let context = self.registry.get_or_create(&session_id).await;
        let request = {
            let mut context = context.lock().await;
            context.begin_turn();
            rewrite_workflow_turn(&mut context, &mut turns);
            prompt::assemble(&context.to_snapshot(), &turns)
        };

        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (chunk_tx, chunk_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let backend = Arc::clone(&self.backend);
        let producer =
            tokio::spawn(async move { backend.stream(&request, event_tx).await });
        tokio::spawn(async move {
            if !forward_deltas(event_rx, &chunk_tx).await {
                // Caller hung up; the producer stops on its next send.
                return;
            }
            match producer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(%exchange, error = %e, "model stream failed");
                    let _ = chunk_tx.send(Err(e)).await;
                }
                Err(e) => {
                    warn!(%exchange, error = %e, "model stream task failed");
                }
            }
        });

        chunk_rx
    }
}

/// Merges a workflow-execution payload carried by the batch's last user
/// turn into the context and rewrites that turn into an execution
/// instruction. Plain and unrecognized content passes through untouched.
fn rewrite_workflow_turn(
    context: &mut draftsmith_conversation::SessionContext,
    turns: &mut [ChatTurn],
) {
    let Some(last) = turns.last_mut() else {
        return;
    };
    if last.role != TurnRole::User {
        return;
    }

    match payload::classify(&last.content) {
        ParsedTurn::WorkflowExecution(payload) => {
            debug!(workflow = payload.workflow_name(), "merging workflow-execution payload");
            context.apply_workflow_execution(&payload);
            last.content = payload.instruction();
        }
        ParsedTurn::Plain | ParsedTurn::Unrecognized => {}
    }
}

/// Drains model events and forwards textual deltas to the caller.
///
/// Deltas are forwarded immediately and in order; events without text
/// are ignored. Returns false when the caller hung up mid-stream.
async fn forward_deltas(
    mut events: mpsc::Receiver<StreamEvent>,
    chunks: &mpsc::Sender<StreamChunk>,
) -> bool {
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Delta(text) => {
                if text.is_empty() {
                    continue;
                }
                if chunks.send(Ok(text)).await.is_err() {
                    debug!("caller hung up mid-stream");
                    return false;
                }
            }
            StreamEvent::Done => {}
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use draftsmith_ai::{LlmProvider, LlmRequest};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Backend that replays a scripted event sequence and records the
    /// request it was given.
    struct ScriptedBackend {
        events: Vec<StreamEvent>,
        failure: Option<LlmError>,
        last_request: StdMutex<Option<LlmRequest>>,
        hung_up: AtomicBool,
    }

    impl ScriptedBackend {
        fn new(events: Vec<StreamEvent>) -> Self {
            Self {
                events,
                failure: None,
                last_request: StdMutex::new(None),
                hung_up: AtomicBool::new(false),
            }
        }

        fn failing(events: Vec<StreamEvent>, failure: LlmError) -> Self {
            Self {
                failure: Some(failure),
                ..Self::new(events)
            }
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn stream(
            &self,
            request: &LlmRequest,
            events: mpsc::Sender<StreamEvent>,
        ) -> Result<(), LlmError> {
            *self.last_request.lock().expect("lock") = Some(request.clone());
            for event in self.events.clone() {
                if events.send(event).await.is_err() {
                    self.hung_up.store(true, Ordering::SeqCst);
                    return Ok(());
                }
            }
            match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(()),
            }
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::OpenAiCompatible
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn service_with(backend: ScriptedBackend) -> (ChatService, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let service = ChatService::new(Arc::new(ContextRegistry::new()), backend.clone());
        (service, backend)
    }

    async fn collect(mut rx: mpsc::Receiver<StreamChunk>) -> Vec<String> {
        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk.expect("stream chunk"));
        }
        chunks
    }

    #[tokio::test]
    async fn streams_chunks_in_order() {
        let (service, _) = service_with(ScriptedBackend::new(vec![
            StreamEvent::Delta("Hel".to_string()),
            StreamEvent::Delta("lo".to_string()),
            StreamEvent::Done,
        ]));

        let rx = service
            .handle_chat(SessionId::default(), vec![ChatTurn::user("hi")])
            .await;

        assert_eq!(collect(rx).await, vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn non_delta_events_yield_no_chunks() {
        let (service, _) = service_with(ScriptedBackend::new(vec![StreamEvent::Done]));

        let rx = service
            .handle_chat(SessionId::default(), vec![ChatTurn::user("hi")])
            .await;

        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn stream_failure_is_the_final_item() {
        let (service, _) = service_with(ScriptedBackend::failing(
            vec![StreamEvent::Delta("partial".to_string())],
            LlmError::RequestFailed {
                reason: "connection reset".to_string(),
            },
        ));

        let mut rx = service
            .handle_chat(SessionId::default(), vec![ChatTurn::user("hi")])
            .await;

        assert_eq!(rx.recv().await, Some(Ok("partial".to_string())));
        let failure = rx.recv().await.expect("error item");
        assert!(failure.is_err());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn message_count_increments_per_batch() {
        let (service, _) = service_with(ScriptedBackend::new(vec![StreamEvent::Done]));
        let session = SessionId::from("counted");

        for _ in 0..3 {
            let rx = service
                .handle_chat(session.clone(), vec![ChatTurn::user("hi")])
                .await;
            collect(rx).await;
        }

        let context = service.registry().get_or_create(&session).await;
        assert_eq!(context.lock().await.message_count, 3);
    }

    #[tokio::test]
    async fn workflow_payload_is_merged_and_rewritten() {
        let (service, backend) = service_with(ScriptedBackend::new(vec![StreamEvent::Done]));
        let session = SessionId::from("wf");
        let content = json!({
            "type": "workflow_execution",
            "workflow": {"name": "Onboarding"},
            "recordData": {"id": 7},
            "formData": {"x": 1},
            "currentStep": 2,
        })
        .to_string();

        let rx = service
            .handle_chat(session.clone(), vec![ChatTurn::user(content)])
            .await;
        collect(rx).await;

        let context = service.registry().get_or_create(&session).await;
        let context = context.lock().await;
        assert_eq!(context.current_workflow["name"], json!("Onboarding"));
        assert_eq!(context.workflow_state.current_step, 2);
        assert_eq!(context.current_record["id"], json!(7));

        let request = backend.last_request.lock().expect("lock");
        let last = &request.as_ref().expect("request").messages.last().expect("turn").content;
        assert!(last.contains("Onboarding"));
        assert!(last.contains("Current Step: 3"));
        assert!(!last.contains("workflow_execution"));
    }

    #[tokio::test]
    async fn plain_text_passes_through_unchanged() {
        let (service, backend) = service_with(ScriptedBackend::new(vec![StreamEvent::Done]));
        let session = SessionId::from("plain");

        let rx = service
            .handle_chat(session.clone(), vec![ChatTurn::user("hello")])
            .await;
        collect(rx).await;

        let context = service.registry().get_or_create(&session).await;
        assert!(context.lock().await.current_workflow.is_empty());

        let request = backend.last_request.lock().expect("lock");
        assert_eq!(
            request.as_ref().expect("request").messages.last().expect("turn").content,
            "hello"
        );
    }

    #[tokio::test]
    async fn empty_batch_gets_synthetic_turn() {
        let (service, backend) = service_with(ScriptedBackend::new(vec![StreamEvent::Done]));

        let rx = service.handle_chat(SessionId::default(), Vec::new()).await;
        collect(rx).await;

        let request = backend.last_request.lock().expect("lock");
        let request = request.as_ref().expect("request");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "");
    }

    #[tokio::test]
    async fn dropping_receiver_cancels_stream() {
        let many_deltas: Vec<StreamEvent> = (0..1000)
            .map(|i| StreamEvent::Delta(format!("chunk {i}")))
            .collect();
        let (service, backend) = service_with(ScriptedBackend::new(many_deltas));

        let mut rx = service
            .handle_chat(SessionId::default(), vec![ChatTurn::user("hi")])
            .await;
        let first = rx.recv().await;
        assert!(first.is_some());
        drop(rx);

        // The producer observes the closed channel on a subsequent send.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(backend.hung_up.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn memory_expires_across_batches() {
        let (service, _) = service_with(ScriptedBackend::new(vec![StreamEvent::Done]));
        let session = SessionId::from("mem");

        let context = service.registry().get_or_create(&session).await;
        context
            .lock()
            .await
            .update_memory("hint", json!("transient"), 1);

        for _ in 0..2 {
            let rx = service
                .handle_chat(session.clone(), vec![ChatTurn::user("hi")])
                .await;
            collect(rx).await;
        }

        assert!(!context.lock().await.memory.contains("hint"));
    }
}
