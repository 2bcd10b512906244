use crate::{types::Content, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The model collaborator contract.
///
/// Every decision node treats a model call as an atomic blocking step
/// with two outcomes: a response or a failure. Providers may stream
/// internally; the graph never observes partial output.
#[async_trait]
pub trait Llm: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, req: LlmRequest) -> Result<LlmResponse>;
}

/// A tool advertised to the model for function calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Whether the model may, or must, call one of the advertised tools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    /// The model must emit a call to one of the advertised tools.
    Required,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub config: Option<GenerateConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<i32>,
    /// JSON schema the response must conform to (structured output).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: Option<Content>,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Other,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            config: None,
            tools: Vec::new(),
            tool_choice: ToolChoice::Auto,
        }
    }

    /// Set the response schema for structured output.
    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        let config = self.config.get_or_insert_with(GenerateConfig::default);
        config.response_schema = Some(schema);
        self
    }

    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

impl LlmResponse {
    pub fn new(content: Content) -> Self {
        Self { content: Some(content), finish_reason: Some(FinishReason::Stop) }
    }

    /// Text of the response content, empty when absent.
    pub fn text(&self) -> String {
        self.content.as_ref().map(|c| c.text()).unwrap_or_default()
    }
}
