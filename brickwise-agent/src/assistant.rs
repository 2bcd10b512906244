//! The assembled building assistant: graph wiring and the run facade.

use crate::config::AgentConfig;
use crate::messages::{final_answer, history, to_value, MESSAGES, QUERY_EVALUATION};
use crate::nodes::{
    CheckQuery, EvaluateQuery, GenerateQuery, PrepareSchemaCall, ResolveMetadata, SourceRouter,
    ToolNode, CHECK_COMPLETION, CHECK_QUERY, EVALUATE_QUERY, GENERATE_QUERY, GET_SCHEMA,
    LIST_TABLES, PREPARE_SCHEMA_CALL, RDF_NODE, RESOLVE_METADATA, ROUTE_SOURCES, RUN_QUERY,
};
use brickwise_core::{declaration, BrickError, Content, Llm, Result};
use brickwise_graph::{
    Checkpointer, CompiledGraph, ExecutionConfig, GraphError, State, StateGraph, StateSchema,
    StreamEvent, START,
};
use brickwise_tools::{
    BrickStore, GetSchemaTool, ListTablesTool, MetadataIndex, RdfToolkit, RunQueryTool, SqlSource,
};
use futures::{Stream, StreamExt};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn map_graph_error(e: GraphError) -> BrickError {
    match e {
        GraphError::RecursionLimitExceeded(steps) => BrickError::Runaway(steps),
        GraphError::JsonError(e) => BrickError::Serde(e),
        other => BrickError::Tool(other.to_string()),
    }
}

/// Question-answering assistant over sensor metadata, Brick models and
/// the timeseries database.
///
/// Construction validates the configuration and wires the full routing
/// graph; a failed construction never produces a half-usable assistant.
pub struct BuildingAssistant {
    graph: CompiledGraph,
}

impl BuildingAssistant {
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn Llm>,
        sql_source: Arc<dyn SqlSource>,
    ) -> Result<Self> {
        config.validate()?;

        let index = Arc::new(MetadataIndex::new(&config.metadata_file));
        let store = Arc::new(BrickStore::new(&config.ttl_dir));

        let list_tables_tool = ListTablesTool::new(sql_source.clone());
        let schema_tool = GetSchemaTool::new(sql_source.clone());
        let run_query_tool = RunQueryTool::new(sql_source, config.top_k);
        let rdf_tool = RdfToolkit::new(store);

        // route_sources and check_completion advertise the two entry
        // tools; generate_query advertises execution and the RDF
        // escape hatch.
        let routing_tools = vec![declaration(&list_tables_tool), declaration(&rdf_tool)];
        let generation_tools = vec![declaration(&run_query_tool), declaration(&rdf_tool)];

        let prepare_schema = PrepareSchemaCall::new(llm.clone(), &config.model, &schema_tool);
        let check_query = CheckQuery::new(
            llm.clone(),
            &config.model,
            &config.dialect,
            index.clone(),
            &run_query_tool,
        );

        let schema = StateSchema::builder()
            .list_channel(MESSAGES)
            .channel(QUERY_EVALUATION)
            .build();

        let graph = StateGraph::new(schema)
            .add_node(ResolveMetadata::new(index))
            .add_node(EvaluateQuery::new(llm.clone(), &config.model))
            .add_node(SourceRouter::route_sources(
                llm.clone(),
                &config.model,
                routing_tools.clone(),
            ))
            .add_node(ToolNode::new(RDF_NODE, Arc::new(rdf_tool)))
            .add_node(ToolNode::new(LIST_TABLES, Arc::new(list_tables_tool)))
            .add_node(prepare_schema)
            .add_node(ToolNode::new(GET_SCHEMA, Arc::new(schema_tool)))
            .add_node(GenerateQuery::new(
                llm.clone(),
                &config.model,
                &config.dialect,
                config.top_k,
                generation_tools,
            ))
            .add_node(check_query)
            .add_node(ToolNode::new(RUN_QUERY, Arc::new(run_query_tool)))
            .add_node(SourceRouter::check_completion(llm, &config.model, routing_tools))
            .add_edge(START, RESOLVE_METADATA)
            .add_edge(RESOLVE_METADATA, EVALUATE_QUERY)
            .add_dynamic_edges(EVALUATE_QUERY, [ROUTE_SOURCES])
            .add_dynamic_edges(ROUTE_SOURCES, [LIST_TABLES, RDF_NODE])
            .add_edge(RDF_NODE, CHECK_COMPLETION)
            .add_edge(LIST_TABLES, PREPARE_SCHEMA_CALL)
            .add_edge(PREPARE_SCHEMA_CALL, GET_SCHEMA)
            .add_edge(GET_SCHEMA, GENERATE_QUERY)
            .add_dynamic_edges(GENERATE_QUERY, [CHECK_QUERY, RDF_NODE])
            .add_dynamic_edges(CHECK_QUERY, [RUN_QUERY])
            .add_edge(RUN_QUERY, GENERATE_QUERY)
            .add_dynamic_edges(CHECK_COMPLETION, [LIST_TABLES, RDF_NODE])
            .compile()
            .map_err(|e| BrickError::Config(e.to_string()))?
            .with_recursion_limit(config.max_steps);

        Ok(Self { graph })
    }

    /// Persist run state through the given checkpointer.
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.graph = self.graph.with_checkpointer_arc(checkpointer);
        self
    }

    fn initial_state(question: &str) -> Result<State> {
        let user = Content::new("user").with_text(question);
        let mut state = State::new();
        state.insert(MESSAGES.to_string(), json!([to_value(&user)?]));
        Ok(state)
    }

    /// Answer a question, running the graph to completion.
    ///
    /// The answer is the text of the last assistant message; a run cut
    /// short by the step ceiling surfaces as [`BrickError::Runaway`].
    pub async fn run(&self, question: &str) -> Result<String> {
        self.run_with_thread(question, &Uuid::new_v4().to_string()).await
    }

    /// Like [`run`](Self::run), with a caller-chosen thread id so the
    /// run can be found again through the checkpointer.
    pub async fn run_with_thread(&self, question: &str, thread_id: &str) -> Result<String> {
        let input = Self::initial_state(question)?;
        tracing::info!(thread_id, "starting run");

        let state = self
            .graph
            .invoke(input, ExecutionConfig::new(thread_id))
            .await
            .map_err(map_graph_error)?;

        let messages = history(state.get(MESSAGES))?;
        final_answer(&messages)
            .ok_or_else(|| BrickError::Model("the run produced no final answer".to_string()))
    }

    /// Answer a question, yielding node-level progress events.
    pub fn run_stream<'a>(
        &'a self,
        question: &str,
    ) -> Result<impl Stream<Item = Result<StreamEvent>> + 'a> {
        let input = Self::initial_state(question)?;
        let config = ExecutionConfig::new(&Uuid::new_v4().to_string());
        Ok(self.graph.stream(input, config).map(|event| event.map_err(map_graph_error)))
    }

    /// Last checkpointed state for a thread, if a checkpointer is set.
    pub async fn state_of(&self, thread_id: &str) -> Result<Option<State>> {
        self.graph.get_state(thread_id).await.map_err(map_graph_error)
    }
}
