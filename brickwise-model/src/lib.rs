//! # brickwise-model
//!
//! Model provider clients: an OpenAI-compatible HTTP client for
//! production and a scripted mock for tests. Both implement the
//! [`brickwise_core::Llm`] contract, so the graph never knows which
//! one it is talking to.

pub mod mock;
pub mod openai;
pub mod retry;

pub use mock::MockLlm;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use retry::RetryPolicy;
