use brickwise_core::{BrickError, Llm, LlmRequest, LlmResponse, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted model for tests: returns the queued responses in order,
/// one per call, and fails once the script runs out.
pub struct MockLlm {
    name: String,
    responses: Mutex<VecDeque<LlmResponse>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), responses: Mutex::new(VecDeque::new()) }
    }

    pub fn with_response(self, response: LlmResponse) -> Self {
        self.push(response);
        self
    }

    pub fn push(&self, response: LlmResponse) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(response);
        }
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _req: LlmRequest) -> Result<LlmResponse> {
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| BrickError::Model("mock response queue poisoned".to_string()))?;
        responses
            .pop_front()
            .ok_or_else(|| BrickError::Model("mock response queue exhausted".to_string()))
    }
}
