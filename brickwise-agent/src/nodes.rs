//! Decision nodes and tool nodes of the routing graph.
//!
//! Each decision node inspects the conversation, invokes the model (or
//! deterministic logic), and returns an append-only update plus its
//! successor directive. Model and facade failures stay in-band: the
//! node appends an explanatory message and falls closed to END so the
//! run always terminates with an inspectable history.

use crate::evaluation::QueryEvaluation;
use crate::messages::{
    assistant_text, history, last_function_call, to_value, tool_result, MESSAGES,
    QUERY_EVALUATION,
};
use crate::prompts;
use brickwise_core::{
    declaration, Content, GenerateConfig, Llm, LlmRequest, Part, Tool, ToolChoice,
    ToolDeclaration,
};
use brickwise_graph::{GraphError, Node, NodeContext, NodeOutput, END};
use brickwise_tools::{MetadataIndex, LIST_TABLES_TOOL, RDF_TOOLKIT, RUN_QUERY_TOOL};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

// Node names, shared with the graph wiring.
pub const RESOLVE_METADATA: &str = "resolve_metadata";
pub const EVALUATE_QUERY: &str = "evaluate_query";
pub const ROUTE_SOURCES: &str = "route_sources";
pub const RDF_NODE: &str = "rdf_toolkit";
pub const LIST_TABLES: &str = "list_tables";
pub const PREPARE_SCHEMA_CALL: &str = "prepare_schema_call";
pub const GET_SCHEMA: &str = "get_schema";
pub const GENERATE_QUERY: &str = "generate_query";
pub const CHECK_QUERY: &str = "check_query";
pub const RUN_QUERY: &str = "run_query";
pub const CHECK_COMPLETION: &str = "check_completion";

type Result<T> = brickwise_graph::Result<T>;

/// Deterministic generation for every decision node.
fn decision_config() -> GenerateConfig {
    GenerateConfig { temperature: Some(0.0), max_output_tokens: None, response_schema: None }
}

fn messages_of(ctx: &NodeContext) -> Result<Vec<Content>> {
    history(ctx.get(MESSAGES)).map_err(|e| GraphError::NodeExecutionFailed {
        node: "history".to_string(),
        message: e.to_string(),
    })
}

fn append(output: NodeOutput, content: &Content) -> Result<NodeOutput> {
    let value = to_value(content).map_err(|e| GraphError::NodeExecutionFailed {
        node: MESSAGES.to_string(),
        message: e.to_string(),
    })?;
    Ok(output.with_update(MESSAGES, value))
}

/// Successor node for an emitted tool name, if the name is recognized.
fn route_for_call(name: &str) -> Option<&'static str> {
    match name {
        RDF_TOOLKIT => Some(RDF_NODE),
        LIST_TABLES_TOOL | "list_tables" | "list_tables_tool" => Some(LIST_TABLES),
        _ => None,
    }
}

/// UUID-shaped tokens (8-4-4-4-12 hex) found in a text.
fn extract_uuids(text: &str) -> Vec<String> {
    fn is_uuid(token: &str) -> bool {
        let bytes = token.as_bytes();
        if bytes.len() != 36 {
            return false;
        }
        token.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
    }

    let mut found = Vec::new();
    for token in text.split(|c: char| !(c.is_ascii_hexdigit() || c == '-')) {
        if is_uuid(token) && !found.iter().any(|t| t == token) {
            found.push(token.to_string());
        }
    }
    found
}

/// 4.1 — Append the buildings/locations summary. No branching; the
/// backing file being missing or malformed is fatal, not absorbed.
pub struct ResolveMetadata {
    index: Arc<MetadataIndex>,
}

impl ResolveMetadata {
    pub fn new(index: Arc<MetadataIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Node for ResolveMetadata {
    fn name(&self) -> &str {
        RESOLVE_METADATA
    }

    async fn execute(&self, _ctx: &NodeContext) -> Result<NodeOutput> {
        let summary = self.index.summary().await.map_err(|e| {
            GraphError::NodeExecutionFailed {
                node: RESOLVE_METADATA.to_string(),
                message: e.to_string(),
            }
        })?;
        append(NodeOutput::new(), &assistant_text(summary))
    }
}

/// 4.2 — Structured validity verdict over the full history.
pub struct EvaluateQuery {
    llm: Arc<dyn Llm>,
    model: String,
}

impl EvaluateQuery {
    pub fn new(llm: Arc<dyn Llm>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }
}

#[async_trait]
impl Node for EvaluateQuery {
    fn name(&self) -> &str {
        EVALUATE_QUERY
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutput> {
        let mut contents = vec![Content::new("system").with_text(prompts::EVALUATE_QUERY)];
        contents.extend(messages_of(ctx)?);

        let request = LlmRequest::new(&self.model, contents)
            .with_config(decision_config())
            .with_response_schema(QueryEvaluation::response_schema());

        let response = match self.llm.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "query evaluation model call failed");
                let message = assistant_text(format!("Query evaluation failed: {e}"));
                return append(NodeOutput::new().with_goto(END), &message);
            }
        };

        let evaluation: QueryEvaluation = match serde_json::from_str(&response.text()) {
            Ok(evaluation) => evaluation,
            Err(_) => QueryEvaluation {
                is_valid: false,
                clarified_query: String::new(),
                explanation: "The evaluation step produced no usable verdict.".to_string(),
            },
        };

        let goto = if evaluation.is_valid { ROUTE_SOURCES } else { END };
        tracing::debug!(is_valid = evaluation.is_valid, "query evaluated");

        let note = assistant_text(format!("Query evaluation: {}", evaluation.explanation));
        let output = NodeOutput::new()
            .with_update(QUERY_EVALUATION, serde_json::to_value(&evaluation)?)
            .with_goto(goto);
        append(output, &note)
    }
}

/// 4.3 / 4.8 — Route the question to a source or terminate. The
/// routing and completion-check nodes share this contract; only the
/// name and directive differ.
pub struct SourceRouter {
    node_name: &'static str,
    prompt: &'static str,
    llm: Arc<dyn Llm>,
    model: String,
    tools: Vec<ToolDeclaration>,
}

impl SourceRouter {
    pub fn route_sources(
        llm: Arc<dyn Llm>,
        model: impl Into<String>,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self { node_name: ROUTE_SOURCES, prompt: prompts::ROUTE_SOURCES, llm, model: model.into(), tools }
    }

    pub fn check_completion(
        llm: Arc<dyn Llm>,
        model: impl Into<String>,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self {
            node_name: CHECK_COMPLETION,
            prompt: prompts::COMPLETION_CHECK,
            llm,
            model: model.into(),
            tools,
        }
    }
}

#[async_trait]
impl Node for SourceRouter {
    fn name(&self) -> &str {
        self.node_name
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutput> {
        let mut contents = vec![Content::new("system").with_text(self.prompt)];
        contents.extend(messages_of(ctx)?);

        let request = LlmRequest::new(&self.model, contents)
            .with_config(decision_config())
            .with_tools(self.tools.clone());

        let response = match self.llm.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(node = self.node_name, error = %e, "routing model call failed");
                let message = assistant_text(format!("Routing failed: {e}"));
                return append(NodeOutput::new().with_goto(END), &message);
            }
        };

        let content = response.content.unwrap_or_else(|| assistant_text(""));
        // No recognized tool name means the answer is already complete.
        let goto = content
            .function_call()
            .and_then(|(name, _, _)| route_for_call(name))
            .unwrap_or(END);

        tracing::debug!(node = self.node_name, goto, "source decision");
        append(NodeOutput::new().with_goto(goto), &content)
    }
}

/// Execute the tool call carried by the last message and append its
/// result. Fixed post-step: the successor is a static edge.
pub struct ToolNode {
    node_name: String,
    tool: Arc<dyn Tool>,
}

impl ToolNode {
    pub fn new(node_name: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        Self { node_name: node_name.into(), tool }
    }
}

#[async_trait]
impl Node for ToolNode {
    fn name(&self) -> &str {
        &self.node_name
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutput> {
        let messages = messages_of(ctx)?;
        let Some((call_name, args, call_id)) =
            messages.last().and_then(|content| content.function_call())
        else {
            let message =
                assistant_text(format!("No tool call to execute at step '{}'.", self.node_name));
            return append(NodeOutput::new(), &message);
        };
        let call_name = call_name.to_string();
        let call_id = call_id.map(|id| id.to_string());

        tracing::debug!(node = %self.node_name, tool = %call_name, "executing tool");
        let payload = match self.tool.execute(args.clone()).await {
            Ok(payload) => payload,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };

        append(NodeOutput::new(), &tool_result(&call_name, payload, call_id))
    }
}

/// 4.5 — Force the model to call the schema tool over the table list.
pub struct PrepareSchemaCall {
    llm: Arc<dyn Llm>,
    model: String,
    schema_tool: ToolDeclaration,
}

impl PrepareSchemaCall {
    pub fn new(llm: Arc<dyn Llm>, model: impl Into<String>, schema_tool: &dyn Tool) -> Self {
        Self { llm, model: model.into(), schema_tool: declaration(schema_tool) }
    }
}

#[async_trait]
impl Node for PrepareSchemaCall {
    fn name(&self) -> &str {
        PREPARE_SCHEMA_CALL
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutput> {
        let mut contents = vec![Content::new("system").with_text(prompts::PREPARE_SCHEMA_CALL)];
        contents.extend(messages_of(ctx)?);

        let request = LlmRequest::new(&self.model, contents)
            .with_config(decision_config())
            .with_tools(vec![self.schema_tool.clone()])
            .with_tool_choice(ToolChoice::Required);

        let content = match self.llm.generate(request).await {
            Ok(response) => response.content.unwrap_or_else(|| assistant_text("")),
            Err(e) => {
                tracing::warn!(error = %e, "schema call preparation failed");
                assistant_text(format!("Schema lookup preparation failed: {e}"))
            }
        };
        append(NodeOutput::new(), &content)
    }
}

/// 4.5 — Generate the next statement, or re-route, or finish.
pub struct GenerateQuery {
    llm: Arc<dyn Llm>,
    model: String,
    dialect: String,
    top_k: usize,
    tools: Vec<ToolDeclaration>,
}

impl GenerateQuery {
    pub fn new(
        llm: Arc<dyn Llm>,
        model: impl Into<String>,
        dialect: impl Into<String>,
        top_k: usize,
        tools: Vec<ToolDeclaration>,
    ) -> Self {
        Self { llm, model: model.into(), dialect: dialect.into(), top_k, tools }
    }
}

#[async_trait]
impl Node for GenerateQuery {
    fn name(&self) -> &str {
        GENERATE_QUERY
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutput> {
        let system = prompts::generate_query(&self.dialect, self.top_k);
        let mut contents = vec![Content::new("system").with_text(system)];
        contents.extend(messages_of(ctx)?);

        let request = LlmRequest::new(&self.model, contents)
            .with_config(decision_config())
            .with_tools(self.tools.clone());

        let content = match self.llm.generate(request).await {
            Ok(response) => response.content.unwrap_or_else(|| assistant_text("")),
            Err(e) => {
                tracing::warn!(error = %e, "query generation model call failed");
                let message = assistant_text(format!("Query generation failed: {e}"));
                return append(NodeOutput::new().with_goto(END), &message);
            }
        };

        let goto = match content.function_call() {
            Some((RUN_QUERY_TOOL, _, _)) => CHECK_QUERY,
            Some((RDF_TOOLKIT, _, _)) => RDF_NODE,
            // Any other outcome means the model judged the answer
            // complete (or confused itself); both end the loop.
            _ => END,
        };

        tracing::debug!(goto, "query generation decision");
        append(NodeOutput::new().with_goto(goto), &content)
    }
}

/// 4.6 — Adversarial re-validation of the candidate statement.
///
/// Two guards run before execution: a deterministic one (a statement
/// filtering on a building name without a previously resolved UUID
/// never executes) and the model checklist. The rewritten call keeps
/// the originating call's correlation id.
pub struct CheckQuery {
    llm: Arc<dyn Llm>,
    model: String,
    dialect: String,
    index: Arc<MetadataIndex>,
    execute_tool: ToolDeclaration,
}

impl CheckQuery {
    pub fn new(
        llm: Arc<dyn Llm>,
        model: impl Into<String>,
        dialect: impl Into<String>,
        index: Arc<MetadataIndex>,
        execute_tool: &dyn Tool,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            dialect: dialect.into(),
            index,
            execute_tool: declaration(execute_tool),
        }
    }

    /// True when the statement filters on a known building code while
    /// using none of the UUIDs already resolved in the conversation.
    async fn filters_on_building(&self, statement: &str, messages: &[Content]) -> bool {
        let codes = match self.index.locations().await {
            Ok(locations) => locations.into_keys().collect::<Vec<_>>(),
            Err(_) => return false,
        };
        let upper = statement.to_uppercase();
        let mentions_building = codes.iter().any(|code| {
            let code = code.to_uppercase();
            upper
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| token == code)
        });
        if !mentions_building {
            return false;
        }

        // UUIDs may sit in tool-result payloads, not only in text
        // parts, so scan the serialized message.
        let resolved: Vec<String> = messages
            .iter()
            .filter_map(|m| serde_json::to_string(m).ok())
            .flat_map(|s| extract_uuids(&s))
            .collect();
        let statement_uuids = extract_uuids(statement);
        !statement_uuids.iter().any(|uuid| resolved.contains(uuid))
    }
}

#[async_trait]
impl Node for CheckQuery {
    fn name(&self) -> &str {
        CHECK_QUERY
    }

    async fn execute(&self, ctx: &NodeContext) -> Result<NodeOutput> {
        let messages = messages_of(ctx)?;
        let Some((_, args, call_id)) = last_function_call(&messages) else {
            let message = assistant_text("No candidate statement to check.");
            return append(NodeOutput::new().with_goto(END), &message);
        };
        let call_id = call_id.map(|id| id.to_string());
        let Some(statement) = args.get("query").and_then(Value::as_str).map(String::from) else {
            let message = assistant_text("The candidate tool call carried no statement.");
            return append(NodeOutput::new().with_goto(END), &message);
        };

        if self.filters_on_building(&statement, &messages).await {
            tracing::debug!("statement filters on building identity without a resolved uuid");
            let message = assistant_text(
                "The generated statement filters on a building name, but the database \
                 is only addressable by sensor UUID and none has been resolved yet. \
                 The query was not executed.",
            );
            return append(NodeOutput::new().with_goto(END), &message);
        }

        let contents = vec![
            Content::new("system").with_text(prompts::check_query(&self.dialect)),
            Content::new("user").with_text(&statement),
        ];
        let request = LlmRequest::new(&self.model, contents)
            .with_config(decision_config())
            .with_tools(vec![self.execute_tool.clone()])
            .with_tool_choice(ToolChoice::Required);

        let mut content = match self.llm.generate(request).await {
            Ok(response) => response.content.unwrap_or_else(|| assistant_text("")),
            Err(e) => {
                tracing::warn!(error = %e, "query check model call failed");
                let message = assistant_text(format!("Query check failed: {e}"));
                return append(NodeOutput::new().with_goto(END), &message);
            }
        };

        if content.function_call().is_none() {
            let message = assistant_text("The query check produced no executable statement.");
            return append(NodeOutput::new().with_goto(END), &message);
        }

        // Results must match back to the request that spawned them.
        for part in &mut content.parts {
            if let Part::FunctionCall { id, .. } = part {
                *id = call_id.clone();
            }
        }

        append(NodeOutput::new().with_goto(RUN_QUERY), &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brickwise_core::LlmResponse;
    use brickwise_graph::{EdgeTarget, ExecutionConfig, State};
    use brickwise_model::MockLlm;
    use serde_json::json;
    use std::io::Write;

    fn scripted(responses: Vec<LlmResponse>) -> Arc<MockLlm> {
        let mut mock = MockLlm::new("scripted");
        for response in responses {
            mock = mock.with_response(response);
        }
        Arc::new(mock)
    }

    fn ctx_with_messages(messages: Vec<Content>) -> NodeContext {
        let values: Vec<Value> = messages.iter().map(|m| to_value(m).unwrap()).collect();
        let mut state = State::new();
        state.insert(MESSAGES.to_string(), json!(values));
        NodeContext::new(state, ExecutionConfig::new("test"), 0)
    }

    fn metadata_index() -> (tempfile::NamedTempFile, Arc<MetadataIndex>) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"BCGW": {"location": "Monopoli"}}"#).unwrap();
        let index = Arc::new(MetadataIndex::new(file.path()));
        (file, index)
    }

    fn goto_of(output: &NodeOutput) -> Option<&EdgeTarget> {
        output.goto.as_ref()
    }

    #[test]
    fn test_extract_uuids() {
        let text = "filter uuid = '550e8400-e29b-41d4-a716-446655440000' or nothing";
        let uuids = extract_uuids(text);
        assert_eq!(uuids, vec!["550e8400-e29b-41d4-a716-446655440000".to_string()]);

        assert!(extract_uuids("no identifiers here").is_empty());
        assert!(extract_uuids("550e8400-e29b-41d4-a716").is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_query_valid_routes_forward() {
        let llm = scripted(vec![LlmResponse::new(assistant_text(
            r#"{"is_valid": true, "clarified_query": "q", "explanation": "domain question"}"#,
        ))]);
        let node = EvaluateQuery::new(llm, "m");

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("q")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::Node(ROUTE_SOURCES.to_string())));
        let stored: QueryEvaluation =
            serde_json::from_value(output.updates[QUERY_EVALUATION].clone()).unwrap();
        assert!(stored.is_valid);
    }

    #[tokio::test]
    async fn test_evaluate_query_invalid_terminates() {
        let llm = scripted(vec![LlmResponse::new(assistant_text(
            r#"{"is_valid": false, "clarified_query": "", "explanation": "not building related"}"#,
        ))]);
        let node = EvaluateQuery::new(llm, "m");

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("tell me a joke")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::End));
    }

    #[tokio::test]
    async fn test_evaluate_query_model_failure_is_absorbed() {
        let llm = scripted(vec![]);
        let node = EvaluateQuery::new(llm, "m");

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("q")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::End));
        assert!(output.updates.contains_key(MESSAGES));
    }

    #[tokio::test]
    async fn test_router_recognizes_rdf_call() {
        let llm = scripted(vec![LlmResponse::new(
            Content::new("assistant").with_part(Part::function_call(
                RDF_TOOLKIT,
                json!({"building_name": "BCGW", "operation": "zones"}),
                Some("c1".into()),
            )),
        )]);
        let node = SourceRouter::route_sources(llm, "m", vec![]);

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("zones of BCGW?")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::Node(RDF_NODE.to_string())));
    }

    #[tokio::test]
    async fn test_router_unrecognized_tool_fails_closed() {
        let llm = scripted(vec![LlmResponse::new(
            Content::new("assistant").with_part(Part::function_call("mystery", json!({}), None)),
        )]);
        let node = SourceRouter::route_sources(llm, "m", vec![]);

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("q")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::End));
    }

    #[tokio::test]
    async fn test_router_plain_answer_terminates() {
        let llm = scripted(vec![LlmResponse::new(assistant_text(
            "BCGW is located in Monopoli.",
        ))]);
        let node = SourceRouter::route_sources(llm, "m", vec![]);

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("where is BCGW?")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::End));
    }

    #[tokio::test]
    async fn test_generate_query_routes_to_check() {
        let llm = scripted(vec![LlmResponse::new(
            Content::new("assistant").with_part(Part::function_call(
                RUN_QUERY_TOOL,
                json!({"query": "SELECT value FROM readings"}),
                Some("c7".into()),
            )),
        )]);
        let node = GenerateQuery::new(llm, "m", "postgresql", 5, vec![]);

        let ctx = ctx_with_messages(vec![Content::new("user").with_text("q")]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::Node(CHECK_QUERY.to_string())));
    }

    #[tokio::test]
    async fn test_check_query_preserves_correlation_id() {
        let (_file, index) = metadata_index();
        let llm = scripted(vec![LlmResponse::new(
            Content::new("assistant").with_part(Part::function_call(
                RUN_QUERY_TOOL,
                json!({"query": "SELECT value FROM readings WHERE uuid = '550e8400-e29b-41d4-a716-446655440000'"}),
                Some("model-made-id".into()),
            )),
        )]);
        let run_query_tool = brickwise_tools::RunQueryTool::new(
            Arc::new(brickwise_tools::StaticSqlSource::new()),
            5,
        );
        let node = CheckQuery::new(llm, "m", "postgresql", index, &run_query_tool);

        let ctx = ctx_with_messages(vec![
            assistant_text("resolved uuid 550e8400-e29b-41d4-a716-446655440000"),
            Content::new("assistant").with_part(Part::function_call(
                RUN_QUERY_TOOL,
                json!({"query": "SELECT value FROM readings WHERE uuid = '550e8400-e29b-41d4-a716-446655440000'"}),
                Some("original-id".into()),
            )),
        ]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::Node(RUN_QUERY.to_string())));
        let appended: Content =
            serde_json::from_value(output.updates[MESSAGES].clone()).unwrap();
        let (_, _, id) = appended.function_call().unwrap();
        assert_eq!(id, Some("original-id"));
    }

    #[tokio::test]
    async fn test_check_query_blocks_building_name_filter() {
        let (_file, index) = metadata_index();
        // The model never gets consulted; the deterministic guard fires first.
        let llm = scripted(vec![]);
        let run_query_tool = brickwise_tools::RunQueryTool::new(
            Arc::new(brickwise_tools::StaticSqlSource::new()),
            5,
        );
        let node = CheckQuery::new(llm, "m", "postgresql", index, &run_query_tool);

        let ctx = ctx_with_messages(vec![Content::new("assistant").with_part(
            Part::function_call(
                RUN_QUERY_TOOL,
                json!({"query": "SELECT value FROM readings WHERE building = 'BCGW'"}),
                Some("c1".into()),
            ),
        )]);
        let output = node.execute(&ctx).await.unwrap();

        assert_eq!(goto_of(&output), Some(&EdgeTarget::End));
    }

    #[tokio::test]
    async fn test_tool_node_appends_result_with_call_id() {
        let source = Arc::new(
            brickwise_tools::StaticSqlSource::new().with_rows(vec![json!({"value": 21.5})]),
        );
        let node = ToolNode::new(RUN_QUERY, Arc::new(brickwise_tools::RunQueryTool::new(source, 5)));

        let ctx = ctx_with_messages(vec![Content::new("assistant").with_part(
            Part::function_call(
                RUN_QUERY_TOOL,
                json!({"query": "SELECT value FROM readings"}),
                Some("c3".into()),
            ),
        )]);
        let output = node.execute(&ctx).await.unwrap();

        let appended: Content =
            serde_json::from_value(output.updates[MESSAGES].clone()).unwrap();
        assert_eq!(appended.role, "tool");
        match &appended.parts[0] {
            Part::FunctionResponse { function_response, id } => {
                assert_eq!(function_response.name, RUN_QUERY_TOOL);
                assert_eq!(function_response.response["row_count"], 1);
                assert_eq!(id.as_deref(), Some("c3"));
            }
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_metadata_appends_summary() {
        let (_file, index) = metadata_index();
        let node = ResolveMetadata::new(index);

        let ctx = ctx_with_messages(vec![]);
        let output = node.execute(&ctx).await.unwrap();

        let appended: Content =
            serde_json::from_value(output.updates[MESSAGES].clone()).unwrap();
        assert!(appended.text().contains("Monopoli"));
        assert!(output.goto.is_none());
    }
}
