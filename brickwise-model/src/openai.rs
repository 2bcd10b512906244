//! OpenAI-compatible chat-completions client.
//!
//! Speaks the `/chat/completions` wire protocol over plain reqwest, so
//! any conforming provider works by swapping the base URL. Calls are
//! non-streaming: every decision in the graph consumes exactly one
//! complete response, so there is nothing to surface incrementally.

use crate::retry::RetryPolicy;
use brickwise_core::{
    BrickError, Content, FinishReason, Llm, LlmRequest, LlmResponse, Part, Result, ToolChoice,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an OpenAI-compatible provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Provider display name used in error messages.
    pub provider_name: String,
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Optional API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_name: "openai".to_string(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    /// Set provider display name used in errors.
    pub fn with_provider_name(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = provider_name.into();
        self
    }

    /// Set a custom API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// OpenAI-compatible client.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(BrickError::Config(format!(
                "{}: API key must not be empty",
                config.provider_name
            )));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| BrickError::Model(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config, retry: RetryPolicy::default() })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    async fn send(&self, body: &ChatRequest) -> Result<ChatResponse> {
        let provider = &self.config.provider_name;

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| BrickError::Model(format!("{provider} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BrickError::Model(format!(
                "{provider} API error: HTTP {} {detail}",
                status.as_u16()
            )));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| BrickError::Model(format!("{provider} returned malformed response: {e}")))
    }
}

#[async_trait]
impl Llm for OpenAiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = build_chat_request(&self.config.model, &request)?;

        let mut retry = 0;
        let raw = loop {
            match self.send(&body).await {
                Ok(raw) => break raw,
                Err(error) if retry + 1 < self.retry.max_attempts
                    && RetryPolicy::is_transient(&error) =>
                {
                    let delay = self.retry.delay(retry);
                    tracing::warn!(
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient provider failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(error) => return Err(error),
            }
        };

        parse_chat_response(&self.config.provider_name, raw)
    }
}

// Wire format.

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded arguments, per the wire protocol.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

fn build_chat_request(model: &str, request: &LlmRequest) -> Result<ChatRequest> {
    let superseded = superseded_call_flags(&request.contents);
    let mut messages = Vec::with_capacity(request.contents.len());
    for (content, superseded) in request.contents.iter().zip(superseded) {
        if superseded && content.text().is_empty() {
            continue;
        }
        messages.push(content_to_message(content, superseded)?);
    }

    let tools = request
        .tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters.clone().unwrap_or_else(|| json!({
                        "type": "object",
                        "properties": {}
                    })),
                }
            })
        })
        .collect();

    let tool_choice = match request.tool_choice {
        ToolChoice::Auto => None,
        ToolChoice::Required => Some("required".to_string()),
    };

    let config = request.config.as_ref();
    let response_format = config.and_then(|c| c.response_schema.as_ref()).map(|schema| {
        let mut schema_with_strict = schema.clone();
        if let Some(obj) = schema_with_strict.as_object_mut() {
            obj.insert("additionalProperties".to_string(), json!(false));
        }
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema_name(schema),
                "schema": schema_with_strict,
                "strict": true,
            }
        })
    });

    Ok(ChatRequest {
        model: model.to_string(),
        messages,
        temperature: config.and_then(|c| c.temperature),
        max_tokens: config.and_then(|c| c.max_output_tokens),
        tools,
        tool_choice,
        response_format,
    })
}

fn schema_name(schema: &Value) -> String {
    schema
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("response")
        .replace(['-', '.', '/', ' '], "_")
}

/// Flags assistant tool-call messages whose correlation id is
/// re-issued by a later assistant message. The history keeps both
/// (it is append-only), but the wire protocol requires every assistant
/// tool call to be answered by a matching tool message, and only the
/// last call carrying a given id ever is. Superseded calls are
/// dropped from the request; their text, if any, survives.
fn superseded_call_flags(contents: &[Content]) -> Vec<bool> {
    let call_ids = |content: &Content| -> Vec<String> {
        content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall { id: Some(id), .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    };

    contents
        .iter()
        .enumerate()
        .map(|(index, content)| {
            if content.role != "assistant" {
                return false;
            }
            let ids = call_ids(content);
            if ids.is_empty() {
                return false;
            }
            contents[index + 1..]
                .iter()
                .filter(|later| later.role == "assistant")
                .any(|later| call_ids(later).iter().any(|id| ids.contains(id)))
        })
        .collect()
}

fn content_to_message(content: &Content, skip_tool_calls: bool) -> Result<ChatMessage> {
    // Facade results go back as role "tool" with the correlation id.
    if let Some(Part::FunctionResponse { function_response, id }) = content
        .parts
        .iter()
        .find(|p| matches!(p, Part::FunctionResponse { .. }))
    {
        let tool_call_id = id.clone().ok_or_else(|| {
            BrickError::Model(format!(
                "tool result for '{}' is missing its correlation id",
                function_response.name
            ))
        })?;
        return Ok(ChatMessage {
            role: "tool".to_string(),
            content: Some(function_response.response.to_string()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id),
        });
    }

    let tool_calls: Vec<WireToolCall> = if skip_tool_calls {
        Vec::new()
    } else {
        content
            .parts
            .iter()
            .enumerate()
            .filter_map(|(index, part)| match part {
                Part::FunctionCall { name, args, id } => Some(WireToolCall {
                    id: id.clone().unwrap_or_else(|| format!("call_{index}")),
                    kind: "function".to_string(),
                    function: WireFunction { name: name.clone(), arguments: args.to_string() },
                }),
                _ => None,
            })
            .collect()
    };

    let text = content.text();
    Ok(ChatMessage {
        role: content.role.clone(),
        content: if text.is_empty() && !tool_calls.is_empty() { None } else { Some(text) },
        tool_calls,
        tool_call_id: None,
    })
}

fn parse_chat_response(provider: &str, raw: ChatResponse) -> Result<LlmResponse> {
    let choice = raw
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BrickError::Model(format!("{provider} returned no choices")))?;

    let mut content = Content::new("assistant");

    if let Some(text) = choice.message.content {
        if !text.is_empty() {
            content = content.with_text(text);
        }
    }

    for call in choice.message.tool_calls {
        let args: Value = serde_json::from_str(&call.function.arguments).unwrap_or(json!({}));
        content = content.with_part(Part::function_call(call.function.name, args, Some(call.id)));
    }

    let finish_reason = choice.finish_reason.map(|reason| match reason.as_str() {
        "stop" | "tool_calls" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        "content_filter" => FinishReason::Safety,
        _ => FinishReason::Other,
    });

    Ok(LlmResponse { content: Some(content), finish_reason })
}
