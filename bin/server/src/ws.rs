//! Chat WebSocket transport.
//!
//! One connection carries many exchanges. Each inbound text frame is
//! either a structured chat frame (`messages` + `context.session_id`)
//! or plain text treated as a single user turn against the default
//! session; malformed input is never an error. Each model delta goes
//! out as its own text frame, in arrival order. Frames are processed
//! sequentially, so turns for one connection cannot interleave.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use draftsmith_chat::ChatService;
use draftsmith_conversation::ChatTurn;
use draftsmith_core::SessionId;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// An inbound chat frame.
#[derive(Debug, Default, Deserialize)]
struct ChatFrame {
    /// The conversation so far.
    #[serde(default)]
    messages: Option<Vec<ChatTurn>>,
    /// Caller-supplied context.
    #[serde(default)]
    context: FrameContext,
    /// Single-message fallback used when `messages` is absent.
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FrameContext {
    #[serde(default)]
    session_id: Option<String>,
}

/// WebSocket upgrade handler for `/ws/chat`.
pub async fn chat_handler(
    State(service): State<Arc<ChatService>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

/// Per-connection loop.
async fn handle_socket(mut socket: WebSocket, service: Arc<ChatService>) {
    info!("chat connection established");

    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "websocket receive failed");
                break;
            }
        };

        match frame {
            Message::Text(text) => {
                let (session_id, turns) = parse_frame(&text);
                let mut chunks = service.handle_chat(session_id, turns).await;
                while let Some(chunk) = chunks.recv().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            // A failed model stream is not masked: the
                            // connection terminates.
                            warn!(error = %e, "model stream failed; closing connection");
                            let _ = socket.send(Message::Close(None)).await;
                            return;
                        }
                    };
                    if socket.send(Message::Text(chunk.into())).await.is_err() {
                        // Client went away; dropping the receiver
                        // cancels the in-flight stream.
                        info!("chat connection lost mid-stream");
                        return;
                    }
                }
            }
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    info!("chat connection ended");
}

/// Interprets one inbound text frame.
///
/// Falls back from structured frames to the `message` field to the raw
/// text, mirroring what callers actually send.
fn parse_frame(text: &str) -> (SessionId, Vec<ChatTurn>) {
    match serde_json::from_str::<ChatFrame>(text) {
        Ok(frame) => {
            let session_id = frame
                .context
                .session_id
                .map(SessionId::from)
                .unwrap_or_default();
            match frame.messages {
                Some(messages) if !messages.is_empty() => (session_id, messages),
                _ => {
                    let content = frame.message.unwrap_or_default();
                    (session_id, vec![ChatTurn::user(content)])
                }
            }
        }
        Err(_) => (SessionId::default(), vec![ChatTurn::user(text)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_conversation::TurnRole;

    #[test]
    fn structured_frame() {
        let text = r#"{
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ],
            "context": {"session_id": "tab-1"}
        }"#;

        let (session_id, turns) = parse_frame(text);
        assert_eq!(session_id.as_str(), "tab-1");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    #[test]
    fn frame_without_messages_uses_message_field() {
        let (session_id, turns) = parse_frame(r#"{"message": "just this"}"#);
        assert_eq!(session_id.as_str(), "default");
        assert_eq!(turns, vec![ChatTurn::user("just this")]);
    }

    #[test]
    fn empty_messages_list_falls_back() {
        let (_, turns) = parse_frame(r#"{"messages": [], "message": "fallback"}"#);
        assert_eq!(turns, vec![ChatTurn::user("fallback")]);
    }

    #[test]
    fn plain_text_frame() {
        let (session_id, turns) = parse_frame("hello there");
        assert_eq!(session_id.as_str(), "default");
        assert_eq!(turns, vec![ChatTurn::user("hello there")]);
    }

    #[test]
    fn bare_json_object_yields_empty_user_turn() {
        let (_, turns) = parse_frame("{}");
        assert_eq!(turns, vec![ChatTurn::user("")]);
    }
}
