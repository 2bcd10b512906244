//! Sequential execution engine for graphs
//!
//! One node runs to completion per step; its updates are merged through
//! the schema reducers before the successor is resolved. Model and
//! facade calls inside nodes are opaque blocking steps from the graph's
//! perspective; the run may be abandoned at any of those await points.

use crate::edge::EdgeTarget;
use crate::error::{GraphError, Result};
use crate::graph::CompiledGraph;
use crate::node::{ExecutionConfig, NodeContext};
use crate::state::{Checkpoint, State};
use crate::stream::StreamEvent;
use std::time::Instant;

/// Sequential executor for a compiled graph
pub struct Executor<'a> {
    graph: &'a CompiledGraph,
    config: ExecutionConfig,
    state: State,
    step: usize,
}

impl<'a> Executor<'a> {
    pub fn new(graph: &'a CompiledGraph, config: ExecutionConfig) -> Self {
        Self { graph, config, state: State::new(), step: 0 }
    }

    /// Run the graph to completion, returning the final state.
    pub async fn run(&mut self, input: State) -> Result<State> {
        self.state = self.initialize_state(input).await?;
        let mut current = EdgeTarget::Node(self.graph.entry_node().to_string());

        while let EdgeTarget::Node(name) = current {
            let (next, _events) = self.execute_step(&name).await?;
            current = next;
        }

        Ok(self.state.clone())
    }

    /// Run with streaming step updates (observability side channel).
    pub fn run_stream(
        mut self,
        input: State,
    ) -> impl futures::Stream<Item = Result<StreamEvent>> + 'a {
        async_stream::stream! {
            match self.initialize_state(input).await {
                Ok(state) => self.state = state,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }

            let mut current = EdgeTarget::Node(self.graph.entry_node().to_string());

            while let EdgeTarget::Node(name) = current {
                yield Ok(StreamEvent::node_start(&name, self.step));
                let started = Instant::now();

                match self.execute_step(&name).await {
                    Ok((next, events)) => {
                        for event in events {
                            yield Ok(event);
                        }
                        let duration_ms = started.elapsed().as_millis() as u64;
                        yield Ok(StreamEvent::node_end(&name, self.step - 1, duration_ms));
                        current = next;
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            yield Ok(StreamEvent::done(self.state.clone(), self.step));
        }
    }

    /// Execute one node: dispatch, merge updates, checkpoint, resolve
    /// the successor. Returns the next target and any custom events
    /// the node emitted.
    async fn execute_step(&mut self, name: &str) -> Result<(EdgeTarget, Vec<StreamEvent>)> {
        if self.step >= self.config.recursion_limit {
            return Err(GraphError::RecursionLimitExceeded(self.step));
        }

        let node = self
            .graph
            .nodes
            .get(name)
            .ok_or_else(|| GraphError::NodeNotFound(name.to_string()))?
            .clone();

        tracing::debug!(node = %name, step = self.step, "dispatching node");

        let ctx = NodeContext::new(self.state.clone(), self.config.clone(), self.step);
        let output = node.execute(&ctx).await.map_err(|e| GraphError::NodeExecutionFailed {
            node: name.to_string(),
            message: e.to_string(),
        })?;

        let crate::node::NodeOutput { updates, goto, events } = output;
        for (key, value) in updates {
            self.graph.schema().apply_update(&mut self.state, &key, value);
        }

        let next = self.graph.resolve_successor(name, goto.as_ref())?;

        self.step += 1;
        self.save_checkpoint(next.node_name()).await?;

        if next.is_end() {
            tracing::debug!(steps = self.step, "run reached END");
        }
        Ok((next, events))
    }

    /// Initialize state from schema defaults, an optional checkpoint,
    /// and the input.
    async fn initialize_state(&self, input: State) -> Result<State> {
        let mut state = self.graph.schema().initialize_state();

        if let Some(checkpoint_id) = &self.config.resume_from {
            if let Some(cp) = self.graph.checkpointer() {
                if let Some(checkpoint) = cp.load_by_id(checkpoint_id).await? {
                    state = checkpoint.state;
                }
            }
        } else if let Some(cp) = self.graph.checkpointer() {
            if let Some(checkpoint) = cp.load(&self.config.thread_id).await? {
                state = checkpoint.state;
            }
        }

        for (key, value) in input {
            self.graph.schema().apply_update(&mut state, &key, value);
        }

        Ok(state)
    }

    async fn save_checkpoint(&self, next_node: Option<&str>) -> Result<()> {
        if let Some(cp) = self.graph.checkpointer() {
            let checkpoint = Checkpoint::new(
                &self.config.thread_id,
                self.state.clone(),
                self.step,
                next_node.map(|s| s.to_string()),
            );
            cp.save(&checkpoint).await?;
        }
        Ok(())
    }
}

/// Convenience methods for CompiledGraph
impl CompiledGraph {
    /// Execute the graph to completion
    pub async fn invoke(&self, input: State, config: ExecutionConfig) -> Result<State> {
        let config = self.clamp_limit(config);
        let mut executor = Executor::new(self, config);
        executor.run(input).await
    }

    /// Execute with streaming step updates
    pub fn stream(
        &self,
        input: State,
        config: ExecutionConfig,
    ) -> impl futures::Stream<Item = Result<StreamEvent>> + '_ {
        let config = self.clamp_limit(config);
        let executor = Executor::new(self, config);
        executor.run_stream(input)
    }

    /// Get current state for a thread
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<State>> {
        if let Some(cp) = self.checkpointer() {
            Ok(cp.load(thread_id).await?.map(|c| c.state))
        } else {
            Ok(None)
        }
    }

    // The tighter of the graph-level and per-run ceilings wins.
    fn clamp_limit(&self, mut config: ExecutionConfig) -> ExecutionConfig {
        config.recursion_limit = config.recursion_limit.min(self.recursion_limit);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{END, START};
    use crate::graph::StateGraph;
    use crate::node::NodeOutput;
    use crate::state::StateSchema;
    use serde_json::json;

    #[tokio::test]
    async fn test_simple_execution() {
        let graph = StateGraph::new(StateSchema::builder().channel("value").build())
            .add_node_fn("set_value", |_ctx| async {
                Ok(NodeOutput::new().with_update("value", json!(42)))
            })
            .add_edge(START, "set_value")
            .add_edge("set_value", END)
            .compile()
            .unwrap();

        let result = graph.invoke(State::new(), ExecutionConfig::new("test")).await.unwrap();

        assert_eq!(result.get("value"), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_dynamic_routing_fail_closed() {
        // A decision node that never sets goto terminates at END.
        let graph = StateGraph::new(StateSchema::builder().channel("visited").build())
            .add_node_fn("decide", |_ctx| async {
                Ok(NodeOutput::new().with_update("visited", json!(true)))
            })
            .add_node_fn("never", |_ctx| async {
                Ok(NodeOutput::new().with_update("visited", json!("never")))
            })
            .add_edge(START, "decide")
            .add_dynamic_edges("decide", ["never"])
            .add_edge("never", END)
            .compile()
            .unwrap();

        let result = graph.invoke(State::new(), ExecutionConfig::new("test")).await.unwrap();
        assert_eq!(result.get("visited"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_cycle_bounded_by_limit() {
        let graph = StateGraph::new(StateSchema::builder().channel("count").build())
            .add_node_fn("looper", |ctx| async move {
                let count = ctx.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
                Ok(NodeOutput::new().with_update("count", json!(count + 1)).with_goto("looper"))
            })
            .add_edge(START, "looper")
            .add_dynamic_edges("looper", ["looper"])
            .compile()
            .unwrap();

        let result = graph
            .invoke(State::new(), ExecutionConfig::new("test").with_recursion_limit(10))
            .await;

        assert!(matches!(result, Err(GraphError::RecursionLimitExceeded(_))));
    }

    #[tokio::test]
    async fn test_cycle_terminates_on_end() {
        let graph = StateGraph::new(StateSchema::builder().channel("count").build())
            .add_node_fn("looper", |ctx| async move {
                let count = ctx.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
                let goto = if count + 1 < 5 { "looper" } else { END };
                Ok(NodeOutput::new().with_update("count", json!(count + 1)).with_goto(goto))
            })
            .add_edge(START, "looper")
            .add_dynamic_edges("looper", ["looper"])
            .compile()
            .unwrap();

        let result = graph.invoke(State::new(), ExecutionConfig::new("test")).await.unwrap();
        assert_eq!(result.get("count"), Some(&json!(5)));
    }
}
