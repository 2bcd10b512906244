//! Per-turn query evaluation record.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Structured verdict produced by the evaluation node, set at most
/// once per user turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEvaluation {
    pub is_valid: bool,
    pub clarified_query: String,
    pub explanation: String,
}

impl QueryEvaluation {
    /// JSON schema for structured model output.
    pub fn response_schema() -> Value {
        json!({
            "title": "query_evaluation",
            "type": "object",
            "properties": {
                "is_valid": {
                    "type": "boolean",
                    "description": "Whether the query is valid for the building domain"
                },
                "clarified_query": {
                    "type": "string",
                    "description": "Clarified version of the query, empty when invalid"
                },
                "explanation": {
                    "type": "string",
                    "description": "Why the query was accepted or rejected"
                }
            },
            "required": ["is_valid", "clarified_query", "explanation"]
        })
    }
}
