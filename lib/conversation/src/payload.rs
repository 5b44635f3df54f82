//! Workflow-execution payload classification.
//!
//! Callers can embed a structured workflow-execution payload in a user
//! turn's content. Classification is an explicit tagged parse so the
//! pipeline's branches are exhaustive: a turn is plain text, a
//! recognized workflow-execution payload, or structured data we do not
//! recognize (passed through untouched).

use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_json::map::Map as JsonMap;

/// Discriminator value marking a workflow-execution payload.
const WORKFLOW_EXECUTION_TYPE: &str = "workflow_execution";

/// A workflow-execution payload embedded in a user turn.
///
/// Missing sub-fields degrade to empty objects (or zero/absent) rather
/// than failing the parse.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkflowExecutionPayload {
    /// The workflow being executed.
    pub workflow: JsonMap<String, JsonValue>,
    /// The record under execution.
    #[serde(rename = "recordData")]
    pub record_data: JsonMap<String, JsonValue>,
    /// Form data accumulated so far.
    #[serde(rename = "formData")]
    pub form_data: JsonMap<String, JsonValue>,
    /// Zero-based index of the step being executed.
    #[serde(rename = "currentStep")]
    pub current_step: i64,
    /// The record identifier, if known.
    #[serde(rename = "recordId")]
    pub record_id: Option<JsonValue>,
}

impl WorkflowExecutionPayload {
    /// Returns the workflow's display name.
    #[must_use]
    pub fn workflow_name(&self) -> &str {
        self.workflow
            .get("name")
            .and_then(JsonValue::as_str)
            .unwrap_or("unnamed workflow")
    }

    /// Renders the context-aware instruction that replaces the payload
    /// turn before prompting.
    ///
    /// Embeds the workflow name, the 1-based step number, and the
    /// serialized record and form data.
    #[must_use]
    pub fn instruction(&self) -> String {
        format!(
            "The user is executing the workflow \"{name}\".\n\
             Current Step: {step}\n\
             Current record: {record}\n\
             Form data so far: {form}\n\
             Provide context-aware guidance for completing this step and \
             respond with type \"workflow\".",
            name = self.workflow_name(),
            step = self.current_step + 1,
            record = JsonValue::Object(self.record_data.clone()),
            form = JsonValue::Object(self.form_data.clone()),
        )
    }
}

/// Outcome of classifying a turn's content.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTurn {
    /// Content is plain text (or structured data that is not an object).
    Plain,
    /// Content is a workflow-execution payload.
    WorkflowExecution(WorkflowExecutionPayload),
    /// Content is structured data without the workflow discriminator.
    Unrecognized,
}

/// Classifies a turn's content.
///
/// A non-match is not an error; the turn simply passes through to the
/// model unmodified.
#[must_use]
pub fn classify(content: &str) -> ParsedTurn {
    let Ok(value) = serde_json::from_str::<JsonValue>(content) else {
        return ParsedTurn::Plain;
    };
    let JsonValue::Object(ref object) = value else {
        return ParsedTurn::Plain;
    };

    if object.get("type").and_then(JsonValue::as_str) != Some(WORKFLOW_EXECUTION_TYPE) {
        return ParsedTurn::Unrecognized;
    }

    match serde_json::from_value::<WorkflowExecutionPayload>(value) {
        Ok(payload) => ParsedTurn::WorkflowExecution(payload),
        Err(_) => ParsedTurn::Unrecognized,
    }
}
