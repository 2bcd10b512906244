//! StateGraph builder for constructing graphs

use crate::checkpoint::Checkpointer;
use crate::edge::{EdgeTarget, Successor, END, START};
use crate::error::{GraphError, Result};
use crate::node::{FunctionNode, Node, NodeContext, NodeOutput};
use crate::state::StateSchema;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Builder for constructing graphs
pub struct StateGraph {
    /// State schema
    pub schema: StateSchema,
    /// Registered nodes
    pub nodes: HashMap<String, Arc<dyn Node>>,
    /// Entry node (from START)
    pub entry: Option<String>,
    /// Successor policy per node
    pub successors: HashMap<String, Successor>,
}

impl StateGraph {
    /// Create a new graph with the given state schema
    pub fn new(schema: StateSchema) -> Self {
        Self { schema, nodes: HashMap::new(), entry: None, successors: HashMap::new() }
    }

    /// Add a node to the graph
    pub fn add_node<N: Node + 'static>(mut self, node: N) -> Self {
        self.nodes.insert(node.name().to_string(), Arc::new(node));
        self
    }

    /// Add a function as a node
    pub fn add_node_fn<F, Fut>(self, name: &str, func: F) -> Self
    where
        F: Fn(NodeContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<NodeOutput>> + Send + 'static,
    {
        self.add_node(FunctionNode::new(name, func))
    }

    /// Add a static edge from source to target.
    ///
    /// An edge from START declares the entry node.
    pub fn add_edge(mut self, source: &str, target: &str) -> Self {
        if source == START {
            self.entry = Some(target.to_string());
        } else {
            self.successors
                .insert(source.to_string(), Successor::Static(EdgeTarget::from(target)));
        }
        self
    }

    /// Declare a decision node: its successor comes from its own
    /// `goto` directive, restricted to the given targets (END is
    /// always admissible).
    pub fn add_dynamic_edges<I, S>(mut self, source: &str, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> =
            targets.into_iter().map(Into::into).filter(|t| t != END).collect();
        self.successors.insert(source.to_string(), Successor::Dynamic { targets });
        self
    }

    /// Compile the graph for execution
    pub fn compile(self) -> Result<CompiledGraph> {
        self.validate()?;
        let entry = self.entry.ok_or(GraphError::NoEntryPoint)?;

        Ok(CompiledGraph {
            schema: self.schema,
            nodes: self.nodes,
            entry,
            successors: self.successors,
            checkpointer: None,
            recursion_limit: 25,
        })
    }

    /// Validate the graph structure
    fn validate(&self) -> Result<()> {
        let entry = self.entry.as_ref().ok_or(GraphError::NoEntryPoint)?;
        if !self.nodes.contains_key(entry) {
            return Err(GraphError::EdgeTargetNotFound(entry.clone()));
        }

        for (source, successor) in &self.successors {
            if !self.nodes.contains_key(source) {
                return Err(GraphError::NodeNotFound(source.clone()));
            }
            match successor {
                Successor::Static(EdgeTarget::Node(name)) => {
                    if !self.nodes.contains_key(name) {
                        return Err(GraphError::EdgeTargetNotFound(name.clone()));
                    }
                }
                Successor::Static(EdgeTarget::End) => {}
                Successor::Dynamic { targets } => {
                    for name in targets {
                        if !self.nodes.contains_key(name) {
                            return Err(GraphError::EdgeTargetNotFound(name.clone()));
                        }
                    }
                }
            }
        }

        // Every node needs a successor policy; a node with none would
        // strand the run mid-graph.
        for name in self.nodes.keys() {
            if !self.successors.contains_key(name) {
                return Err(GraphError::InvalidGraph(format!(
                    "node '{name}' has no outgoing edge; route it to END explicitly"
                )));
            }
        }

        Ok(())
    }
}

/// A compiled graph ready for execution
pub struct CompiledGraph {
    pub(crate) schema: StateSchema,
    pub(crate) nodes: HashMap<String, Arc<dyn Node>>,
    pub(crate) entry: String,
    pub(crate) successors: HashMap<String, Successor>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer>>,
    pub(crate) recursion_limit: usize,
}

impl CompiledGraph {
    /// Configure checkpointing
    pub fn with_checkpointer<C: Checkpointer + 'static>(mut self, checkpointer: C) -> Self {
        self.checkpointer = Some(Arc::new(checkpointer));
        self
    }

    /// Configure checkpointing with Arc
    pub fn with_checkpointer_arc(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Set the step ceiling for cyclic paths
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Entry node name
    pub fn entry_node(&self) -> &str {
        &self.entry
    }

    /// Resolve the node that runs after `node`, given the directive it
    /// returned. Static edges ignore the directive; dynamic edges
    /// validate it against the declared set and fail closed to END
    /// when it is absent.
    pub fn resolve_successor(
        &self,
        node: &str,
        goto: Option<&EdgeTarget>,
    ) -> Result<EdgeTarget> {
        match self.successors.get(node) {
            Some(Successor::Static(target)) => Ok(target.clone()),
            Some(successor @ Successor::Dynamic { .. }) => match goto {
                None | Some(EdgeTarget::End) => Ok(EdgeTarget::End),
                Some(EdgeTarget::Node(name)) => {
                    if successor.allows(name) {
                        Ok(EdgeTarget::Node(name.clone()))
                    } else {
                        Err(GraphError::UnknownRouteTarget {
                            node: node.to_string(),
                            target: name.clone(),
                        })
                    }
                }
            },
            None => Err(GraphError::NodeNotFound(node.to_string())),
        }
    }

    /// Get the state schema
    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    /// Get the checkpointer if configured
    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }
}
