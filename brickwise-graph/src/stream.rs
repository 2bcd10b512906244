//! Streaming events emitted while a graph run progresses.

use crate::state::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event emitted during streaming execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A node is about to execute
    NodeStart { node: String, step: usize },
    /// A node finished executing
    NodeEnd {
        node: String,
        step: usize,
        duration_ms: u64,
    },
    /// Custom payload emitted by a node
    Custom { node: String, payload: Value },
    /// The run reached its terminal edge
    Done { state: State, total_steps: usize },
}

impl StreamEvent {
    pub fn node_start(node: &str, step: usize) -> Self {
        Self::NodeStart {
            node: node.to_string(),
            step,
        }
    }

    pub fn node_end(node: &str, step: usize, duration_ms: u64) -> Self {
        Self::NodeEnd {
            node: node.to_string(),
            step,
            duration_ms,
        }
    }

    pub fn custom(node: &str, payload: Value) -> Self {
        Self::Custom {
            node: node.to_string(),
            payload,
        }
    }

    pub fn done(state: State, total_steps: usize) -> Self {
        Self::Done { state, total_steps }
    }

    /// The node this event concerns, if any.
    pub fn node_name(&self) -> Option<&str> {
        match self {
            Self::NodeStart { node, .. }
            | Self::NodeEnd { node, .. }
            | Self::Custom { node, .. } => Some(node),
            Self::Done { .. } => None,
        }
    }
}
