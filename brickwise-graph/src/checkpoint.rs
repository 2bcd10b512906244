//! Checkpointing for graph state
//!
//! The checkpoint mechanism is a pluggable collaborator: the executor
//! saves state after every step through this trait and never depends
//! on a particular backend. The in-memory implementation is sufficient
//! for runs that do not need durability across restarts.

use crate::error::Result;
use crate::state::Checkpoint;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Checkpointer trait for persistence
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Save a checkpoint
    async fn save(&self, checkpoint: &Checkpoint) -> Result<String>;

    /// Load the latest checkpoint for a thread
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Load a specific checkpoint by ID
    async fn load_by_id(&self, checkpoint_id: &str) -> Result<Option<Checkpoint>>;

    /// List all checkpoints for a thread
    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>>;
}

/// In-memory checkpointer
#[derive(Default)]
pub struct MemoryCheckpointer {
    checkpoints: Arc<RwLock<HashMap<String, Vec<Checkpoint>>>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn save(&self, checkpoint: &Checkpoint) -> Result<String> {
        let mut store = self.checkpoints.write().await;
        store.entry(checkpoint.thread_id.clone()).or_default().push(checkpoint.clone());
        Ok(checkpoint.checkpoint_id.clone())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let store = self.checkpoints.read().await;
        Ok(store.get(thread_id).and_then(|checkpoints| checkpoints.last()).cloned())
    }

    async fn load_by_id(&self, checkpoint_id: &str) -> Result<Option<Checkpoint>> {
        let store = self.checkpoints.read().await;
        for checkpoints in store.values() {
            if let Some(found) =
                checkpoints.iter().find(|c| c.checkpoint_id == checkpoint_id)
            {
                return Ok(Some(found.clone()));
            }
        }
        Ok(None)
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>> {
        let store = self.checkpoints.read().await;
        Ok(store.get(thread_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;

    #[tokio::test]
    async fn test_memory_checkpointer() {
        let cp = MemoryCheckpointer::new();

        let checkpoint = Checkpoint::new("thread_1", State::new(), 0, Some("a".to_string()));
        let id = cp.save(&checkpoint).await.unwrap();
        assert!(!id.is_empty());

        let loaded = cp.load("thread_1").await.unwrap().unwrap();
        assert_eq!(loaded.step, 0);
        assert_eq!(loaded.next_node.as_deref(), Some("a"));

        let checkpoint2 = Checkpoint::new("thread_1", State::new(), 1, None);
        cp.save(&checkpoint2).await.unwrap();

        // Latest wins
        let loaded = cp.load("thread_1").await.unwrap().unwrap();
        assert_eq!(loaded.step, 1);

        let all = cp.list("thread_1").await.unwrap();
        assert_eq!(all.len(), 2);

        let by_id = cp.load_by_id(&id).await.unwrap().unwrap();
        assert_eq!(by_id.step, 0);
    }

    #[tokio::test]
    async fn test_load_unknown_thread() {
        let cp = MemoryCheckpointer::new();
        assert!(cp.load("nope").await.unwrap().is_none());
        assert!(cp.load_by_id("nope").await.unwrap().is_none());
    }
}
