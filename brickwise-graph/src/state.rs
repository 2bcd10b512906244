//! State management for graph execution
//!
//! State is a map of channel names to JSON values. Each channel has a
//! reducer that controls how node updates are merged: `Overwrite`
//! replaces, `Append` extends a list and never removes. The message
//! history rides on an `Append` channel, which makes the append-only
//! ordering invariant structural rather than a convention.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Graph state - a map of channel names to values
pub type State = HashMap<String, Value>;

/// Reducer determines how state updates are merged
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reducer {
    /// Replace the value entirely (default)
    #[default]
    Overwrite,
    /// Append to a list; prior entries are never truncated or reordered
    Append,
}

/// Channel definition for a state field
#[derive(Clone, Debug)]
pub struct Channel {
    pub name: String,
    pub reducer: Reducer,
    pub default: Option<Value>,
}

impl Channel {
    /// Create a new channel with overwrite semantics
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), reducer: Reducer::Overwrite, default: None }
    }

    /// Create a list channel with append semantics
    pub fn list(name: &str) -> Self {
        Self { name: name.to_string(), reducer: Reducer::Append, default: Some(json!([])) }
    }
}

/// State schema defines channels and their reducers
#[derive(Clone, Debug, Default)]
pub struct StateSchema {
    pub channels: HashMap<String, Channel>,
}

impl StateSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> StateSchemaBuilder {
        StateSchemaBuilder::default()
    }

    /// Get the reducer for a channel; unknown channels overwrite.
    pub fn get_reducer(&self, channel: &str) -> Reducer {
        self.channels.get(channel).map(|c| c.reducer).unwrap_or_default()
    }

    /// Apply an update to state using the appropriate reducer
    pub fn apply_update(&self, state: &mut State, key: &str, value: Value) {
        let new_value = match self.get_reducer(key) {
            Reducer::Overwrite => value,
            Reducer::Append => {
                let current = state.get(key).cloned().unwrap_or(Value::Null);
                let mut arr = match current {
                    Value::Array(a) => a,
                    Value::Null => vec![],
                    other => vec![other],
                };
                match value {
                    Value::Array(items) => arr.extend(items),
                    other => arr.push(other),
                }
                Value::Array(arr)
            }
        };

        state.insert(key.to_string(), new_value);
    }

    /// Initialize state with default values
    pub fn initialize_state(&self) -> State {
        let mut state = State::new();
        for (name, channel) in &self.channels {
            if let Some(default) = &channel.default {
                state.insert(name.clone(), default.clone());
            }
        }
        state
    }
}

/// Builder for StateSchema
#[derive(Default)]
pub struct StateSchemaBuilder {
    channels: HashMap<String, Channel>,
}

impl StateSchemaBuilder {
    /// Add a channel with overwrite semantics
    pub fn channel(mut self, name: &str) -> Self {
        self.channels.insert(name.to_string(), Channel::new(name));
        self
    }

    /// Add a channel with append semantics (for lists)
    pub fn list_channel(mut self, name: &str) -> Self {
        self.channels.insert(name.to_string(), Channel::list(name));
        self
    }

    pub fn build(self) -> StateSchema {
        StateSchema { channels: self.channels }
    }
}

/// Checkpoint data structure for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Thread identifier
    pub thread_id: String,
    /// Unique checkpoint ID
    pub checkpoint_id: String,
    /// State at this checkpoint
    pub state: State,
    /// Step number
    pub step: usize,
    /// Node due to execute next, None when the run has ended
    pub next_node: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Checkpoint {
    pub fn new(thread_id: &str, state: State, step: usize, next_node: Option<String>) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            checkpoint_id: uuid::Uuid::new_v4().to_string(),
            state,
            step,
            next_node,
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_reducer() {
        let schema = StateSchema::builder().channel("value").build();
        let mut state = State::new();

        schema.apply_update(&mut state, "value", json!(1));
        assert_eq!(state.get("value"), Some(&json!(1)));

        schema.apply_update(&mut state, "value", json!(2));
        assert_eq!(state.get("value"), Some(&json!(2)));
    }

    #[test]
    fn test_append_reducer() {
        let schema = StateSchema::builder().list_channel("messages").build();
        let mut state = schema.initialize_state();

        schema.apply_update(&mut state, "messages", json!({"role": "user", "content": "hi"}));
        assert_eq!(state.get("messages"), Some(&json!([{"role": "user", "content": "hi"}])));

        schema.apply_update(
            &mut state,
            "messages",
            json!([{"role": "assistant", "content": "hello"}]),
        );
        assert_eq!(
            state.get("messages"),
            Some(&json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ]))
        );
    }

    #[test]
    fn test_append_never_shrinks() {
        let schema = StateSchema::builder().list_channel("messages").build();
        let mut state = schema.initialize_state();

        let mut last_len = 0;
        for i in 0..5 {
            schema.apply_update(&mut state, "messages", json!({"n": i}));
            let len = state.get("messages").and_then(|v| v.as_array()).unwrap().len();
            assert!(len > last_len);
            last_len = len;
        }
    }

    #[test]
    fn test_unknown_channel_overwrites() {
        let schema = StateSchema::new();
        let mut state = State::new();
        schema.apply_update(&mut state, "anything", json!("a"));
        schema.apply_update(&mut state, "anything", json!("b"));
        assert_eq!(state.get("anything"), Some(&json!("b")));
    }
}
