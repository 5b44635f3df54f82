//! Prompt assembly.
//!
//! Every request to the model is built the same way: the fixed
//! behavioral instruction, the serialized session context snapshot as
//! grounding, then the caller's turns in original order. Assembly is
//! deterministic and never fails.

use draftsmith_ai::{LlmMessage, LlmRequest};
use draftsmith_conversation::{ChatTurn, ContextSnapshot, TurnRole};

/// The fixed behavioral instruction sent with every request.
///
/// Encodes the assistant's scope, the mandated reply contract, the
/// default-schema short-circuit, and the refusal rule.
pub const SYSTEM_INSTRUCTION: &str = "\
You are an expert assistant for designing custom applications across various domains. \
Your job is to help users define what kind of application they want to build, and to \
guide them through executing in-progress workflows. \
Start by asking what domain or industry they are focusing on (e.g., CRM, ERP, field \
service, e-commerce, project management, etc.). \
Ask clarifying questions about the workflows, objects, entities, and requirements until \
you are confident you have all the details. \
IMPORTANT: You must ALWAYS respond with valid JSON in this exact format:\n\
{\n\
  \"reply\": \"Your response text here\",\n\
  \"type\": \"continue|admin|user|workflow\",\n\
  \"config\": {}\n\
}\n\n\
Response types:\n\
- 'continue': When you need more information from the user (ask clarifying questions)\n\
- 'admin': When you have enough information and are ready to show the admin interface\n\
- 'user': For general user responses\n\
- 'workflow': For context-aware guidance on the workflow execution described in the context\n\n\
For 'admin' type responses:\n\
- Include bullet points in the reply explaining what you're doing\n\
- Put the complete JSON schema in the 'config' field with objects and workflows\n\
If the user asks about anything else, politely refuse and remind them you only help with \
custom app creation and workflow execution. \
If the user says anything like 'decide by yourself', 'you decide', 'no specifics', \
'default', or does not provide more details after 2 clarifying questions, IMMEDIATELY \
proceed to generate a default schema for a common application type and reply with type \
'admin'. Do NOT ask for more details. Make reasonable assumptions based on common \
business applications.";

/// Assembles the model request for one turn-batch.
///
/// Caller turns are filtered to non-empty user/assistant turns, kept in
/// original order. When none survive, a single empty-content user turn
/// is substituted so the model always receives at least one addressable
/// turn.
#[must_use]
pub fn assemble(snapshot: &ContextSnapshot, turns: &[ChatTurn]) -> LlmRequest {
    let context_json =
        serde_json::to_string_pretty(snapshot).unwrap_or_else(|_| "{}".to_string());
    let system = format!("{SYSTEM_INSTRUCTION}\n\nContext: {context_json}\n");

    let mut messages: Vec<LlmMessage> = turns
        .iter()
        .filter(|turn| turn.is_promptable())
        .map(|turn| match turn.role {
            TurnRole::User => LlmMessage::user(turn.content.as_str()),
            TurnRole::Assistant => LlmMessage::assistant(turn.content.as_str()),
            TurnRole::System => LlmMessage::system(turn.content.as_str()),
        })
        .collect();

    if messages.is_empty() {
        messages.push(LlmMessage::user(""));
    }

    LlmRequest::new(messages).with_system(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_conversation::SessionContext;
    use draftsmith_core::SessionId;
    use serde_json::json;

    fn snapshot() -> ContextSnapshot {
        SessionContext::new(SessionId::from("s1")).to_snapshot()
    }

    #[test]
    fn system_carries_instruction_and_context() {
        let request = assemble(&snapshot(), &[ChatTurn::user("hi")]);

        let system = request.system.expect("system instruction");
        assert!(system.contains("valid JSON"));
        assert!(system.contains("continue|admin|user|workflow"));
        assert!(system.contains("Context: {"));
        assert!(system.contains("\"id\": \"s1\""));
    }

    #[test]
    fn turns_keep_original_order() {
        let turns = [
            ChatTurn::user("first"),
            ChatTurn::assistant("second"),
            ChatTurn::user("third"),
        ];
        let request = assemble(&snapshot(), &turns);

        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn unrecognized_roles_and_empty_turns_are_dropped() {
        let turns = [
            ChatTurn::system("ignore me"),
            ChatTurn::user(""),
            ChatTurn::user("kept"),
        ];
        let request = assemble(&snapshot(), &turns);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "kept");
    }

    #[test]
    fn empty_turn_list_gets_synthetic_user_turn() {
        let request = assemble(&snapshot(), &[]);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "");
    }

    #[test]
    fn snapshot_memory_appears_in_context() {
        let mut ctx = SessionContext::new(SessionId::default());
        ctx.update_memory("domain", json!("field service"), 0);

        let request = assemble(&ctx.to_snapshot(), &[]);
        assert!(request.system.expect("system").contains("field service"));
    }
}
