//! SQL facade: source contract, read-only statement guard, and the
//! three tools the graph wires in (list tables, fetch schema, run
//! query).
//!
//! The guard is enforced here, not delegated to the model: exactly one
//! statement, SELECT-only, no wildcard projection, and results capped
//! at the configured top-K unless the statement carries its own LIMIT.

use brickwise_core::{BrickError, Result, Tool};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const LIST_TABLES_TOOL: &str = "sql_db_list_tables";
pub const GET_SCHEMA_TOOL: &str = "sql_db_schema";
pub const RUN_QUERY_TOOL: &str = "sql_db_query";

/// Contract the routing core consumes; the backing engine is external.
#[async_trait]
pub trait SqlSource: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;
    async fn table_schema(&self, table_names: &[String]) -> Result<String>;
    async fn run_query(&self, statement: &str) -> Result<Vec<Value>>;
}

/// Reject anything but a single, wildcard-free SELECT.
pub fn validate_statement(statement: &str) -> std::result::Result<(), String> {
    let trimmed = statement.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() {
        return Err("empty statement".to_string());
    }
    if trimmed.contains(';') {
        return Err("multiple statements are not allowed".to_string());
    }

    let first_word = trimmed.split_whitespace().next().unwrap_or("").to_uppercase();
    if first_word != "SELECT" {
        return Err(format!("only SELECT statements are allowed, found '{first_word}'"));
    }

    // Wildcard projection check covers `SELECT *` and `SELECT t.*`.
    let upper = trimmed.to_uppercase();
    let projection = match upper.find(" FROM ") {
        Some(from) => &upper[6..from],
        None => &upper[6..],
    };
    if projection.contains('*') {
        return Err("wildcard projection (SELECT *) is not allowed".to_string());
    }

    Ok(())
}

/// Whether the statement carries its own LIMIT clause.
pub fn has_explicit_limit(statement: &str) -> bool {
    statement.to_uppercase().split_whitespace().any(|word| word == "LIMIT")
}

/// List the tables of the backing store.
pub struct ListTablesTool {
    source: Arc<dyn SqlSource>,
}

impl ListTablesTool {
    pub fn new(source: Arc<dyn SqlSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for ListTablesTool {
    fn name(&self) -> &str {
        LIST_TABLES_TOOL
    }

    fn description(&self) -> &str {
        "List the tables available in the sensor database."
    }

    async fn execute(&self, _args: Value) -> Result<Value> {
        match self.source.list_tables().await {
            Ok(tables) => Ok(json!({ "tables": tables })),
            Err(e) => Ok(json!({ "error": e.to_string() })),
        }
    }
}

/// Fetch column descriptions for the named tables.
pub struct GetSchemaTool {
    source: Arc<dyn SqlSource>,
}

impl GetSchemaTool {
    pub fn new(source: Arc<dyn SqlSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for GetSchemaTool {
    fn name(&self) -> &str {
        GET_SCHEMA_TOOL
    }

    fn description(&self) -> &str {
        "Fetch the schema of the named tables. Input: comma-separated table names."
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "table_names": {
                    "type": "string",
                    "description": "Comma-separated table names, e.g. 'sensors, readings'"
                }
            },
            "required": ["table_names"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let names: Vec<String> = args
            .get("table_names")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(json!({ "error": "table_names is required" }));
        }
        match self.source.table_schema(&names).await {
            Ok(schema) => Ok(json!({ "schema": schema })),
            Err(e) => Ok(json!({ "error": e.to_string() })),
        }
    }
}

/// Execute a checked statement against the backing store.
pub struct RunQueryTool {
    source: Arc<dyn SqlSource>,
    top_k: usize,
}

impl RunQueryTool {
    pub fn new(source: Arc<dyn SqlSource>, top_k: usize) -> Self {
        Self { source, top_k }
    }
}

#[async_trait]
impl Tool for RunQueryTool {
    fn name(&self) -> &str {
        RUN_QUERY_TOOL
    }

    fn description(&self) -> &str {
        "Execute a single read-only SELECT statement and return the rows."
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A single SELECT statement"
                }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let statement = match args.get("query").and_then(|v| v.as_str()) {
            Some(statement) => statement.to_string(),
            None => return Ok(json!({ "error": "query is required" })),
        };

        if let Err(violation) = validate_statement(&statement) {
            tracing::debug!(%violation, "rejected sql statement");
            return Ok(json!({ "error": format!("statement rejected: {violation}") }));
        }

        match self.source.run_query(&statement).await {
            Ok(mut rows) => {
                if !has_explicit_limit(&statement) {
                    rows.truncate(self.top_k);
                }
                Ok(json!({ "rows": rows, "row_count": rows.len() }))
            }
            Err(e) => Ok(json!({ "error": e.to_string() })),
        }
    }
}

/// In-memory source for tests and offline runs.
#[derive(Default)]
pub struct StaticSqlSource {
    tables: Vec<String>,
    schema: String,
    rows: Vec<Value>,
    fail_with: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl StaticSqlSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Statements passed to `run_query`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SqlSource for StaticSqlSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.clone())
    }

    async fn table_schema(&self, _table_names: &[String]) -> Result<String> {
        Ok(self.schema.clone())
    }

    async fn run_query(&self, statement: &str) -> Result<Vec<Value>> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(statement.to_string());
        }
        if let Some(message) = &self.fail_with {
            return Err(BrickError::Tool(message.clone()));
        }
        Ok(self.rows.clone())
    }
}
