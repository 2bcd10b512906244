//! Conversion helpers between graph state and the message model.
//!
//! The `messages` channel stores serialized `Content` values. Nodes
//! deserialize the history, call the model, and append their own
//! entries; nothing here ever rewrites an existing entry.

use brickwise_core::{BrickError, Content, Part, Result};
use serde_json::Value;

pub const MESSAGES: &str = "messages";
pub const QUERY_EVALUATION: &str = "query_evaluation";

/// Deserialize the message history from state.
pub fn history(state_messages: Option<&Value>) -> Result<Vec<Content>> {
    let Some(value) = state_messages else {
        return Ok(Vec::new());
    };
    let entries = value
        .as_array()
        .ok_or_else(|| BrickError::Tool("messages channel is not a list".to_string()))?;
    entries
        .iter()
        .map(|entry| {
            serde_json::from_value(entry.clone())
                .map_err(|e| BrickError::Tool(format!("malformed message in history: {e}")))
        })
        .collect()
}

/// Serialize a message for appending to the channel.
pub fn to_value(content: &Content) -> Result<Value> {
    serde_json::to_value(content).map_err(BrickError::from)
}

/// A plain assistant message.
pub fn assistant_text(text: impl Into<String>) -> Content {
    Content::new("assistant").with_text(text)
}

/// The most recent function call in the history, newest first.
pub fn last_function_call(history: &[Content]) -> Option<(&str, &Value, Option<&str>)> {
    history.iter().rev().find_map(|content| content.function_call())
}

/// The tool-result message for a completed call.
pub fn tool_result(name: &str, response: Value, call_id: Option<String>) -> Content {
    Content::new("tool").with_part(Part::function_response(name, response, call_id))
}

/// Text of the last assistant message, for the final answer.
pub fn final_answer(history: &[Content]) -> Option<String> {
    history
        .iter()
        .rev()
        .find(|content| content.role == "assistant" && !content.text().is_empty())
        .map(|content| content.text())
}
