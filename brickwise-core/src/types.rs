use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponseData {
    pub name: String,
    pub response: serde_json::Value,
}

/// A role-tagged message exchanged with the model.
///
/// Roles follow the conversation contract: `system`, `user`,
/// `assistant`, and `tool` (for facade results fed back to the model).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        name: String,
        args: serde_json::Value,
        /// Correlation id matching the call to its eventual response.
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    FunctionResponse {
        function_response: FunctionResponseData,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl Content {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into(), parts: Vec::new() }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(Part::Text { text: text.into() });
        self
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(|p| p.text()).collect::<Vec<_>>().join("")
    }

    /// First function call part, if any.
    pub fn function_call(&self) -> Option<(&str, &serde_json::Value, Option<&str>)> {
        self.parts.iter().find_map(|p| match p {
            Part::FunctionCall { name, args, id } => Some((name.as_str(), args, id.as_deref())),
            _ => None,
        })
    }
}

impl Part {
    /// Returns the text content if this is a Text part, None otherwise
    pub fn text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn text_part(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_call(
        name: impl Into<String>,
        args: serde_json::Value,
        id: Option<String>,
    ) -> Self {
        Part::FunctionCall { name: name.into(), args, id }
    }

    pub fn function_response(
        name: impl Into<String>,
        response: serde_json::Value,
        id: Option<String>,
    ) -> Self {
        Part::FunctionResponse {
            function_response: FunctionResponseData { name: name.into(), response },
            id,
        }
    }
}
