//! # brickwise-graph
//!
//! Orchestration state machine for the brickwise assistant.
//!
//! A graph is a fixed topology of named nodes connected by two kinds of
//! edges:
//!
//! - **Static edges**: after the source node runs, control always moves
//!   to the declared target.
//! - **Dynamic edges**: the source node is a decision node. It returns
//!   its own successor (a `goto` directive) chosen from a closed,
//!   declared target set. A missing or unrecognized choice falls back
//!   to END, so a confused decision node terminates the run instead of
//!   looping.
//!
//! Execution is single-threaded and cooperative: exactly one node runs
//! to completion per step, its updates are merged into state through
//! the schema reducers, and the next node is resolved from the edge
//! table. A configurable step ceiling bounds cyclic paths; exceeding it
//! is a distinct error, never a silent truncation.
//!
//! ```rust,ignore
//! use brickwise_graph::prelude::*;
//!
//! let schema = StateSchema::builder().list_channel("messages").build();
//! let graph = StateGraph::new(schema)
//!     .add_node_fn("gather", |ctx| async move {
//!         Ok(NodeOutput::new().with_update("messages", json!({"role": "assistant", "content": "hi"})))
//!     })
//!     .add_node_fn("decide", |ctx| async move {
//!         Ok(NodeOutput::new().with_goto(END))
//!     })
//!     .add_edge(START, "gather")
//!     .add_edge("gather", "decide")
//!     .add_dynamic_edges("decide", ["gather"])
//!     .compile()?;
//!
//! let out = graph.invoke(State::new(), ExecutionConfig::new("thread-1")).await?;
//! ```

pub mod checkpoint;
pub mod edge;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod state;
pub mod stream;

pub use checkpoint::{Checkpointer, MemoryCheckpointer};
pub use edge::{EdgeTarget, Successor, END, START};
pub use error::{GraphError, Result};
pub use executor::Executor;
pub use graph::{CompiledGraph, StateGraph};
pub use node::{ExecutionConfig, FunctionNode, Node, NodeContext, NodeOutput};
pub use state::{Channel, Checkpoint, Reducer, State, StateSchema, StateSchemaBuilder};
pub use stream::StreamEvent;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::checkpoint::{Checkpointer, MemoryCheckpointer};
    pub use crate::edge::{EdgeTarget, Successor, END, START};
    pub use crate::error::{GraphError, Result};
    pub use crate::graph::{CompiledGraph, StateGraph};
    pub use crate::node::{ExecutionConfig, FunctionNode, Node, NodeContext, NodeOutput};
    pub use crate::state::{Channel, Checkpoint, Reducer, State, StateSchema, StateSchemaBuilder};
    pub use crate::stream::StreamEvent;

    pub use serde_json::{json, Value};
}
