use crate::{model::ToolDeclaration, Result};
use async_trait::async_trait;
use serde_json::Value;

/// The external capability contract consumed by the routing graph.
///
/// Facade implementations (SQL introspection/execution, the RDF
/// toolkit) live behind this trait so decision nodes depend only on
/// the call signature. Tools that absorb failures in-band return an
/// `{"error": ...}` payload instead of an `Err`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Option<Value> {
        None
    }

    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Declaration advertised to the model for a tool.
pub fn declaration(tool: &dyn Tool) -> ToolDeclaration {
    ToolDeclaration {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
    }
}
