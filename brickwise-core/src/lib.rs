//! # brickwise-core
//!
//! Core traits and types shared by the brickwise crates:
//!
//! - [`Content`] / [`Part`] - role-tagged message model
//! - [`Llm`] - the model collaborator contract
//! - [`Tool`] - the external capability contract
//! - [`BrickError`] / [`Result`] - unified error handling
//!
//! Every node in the routing graph speaks in terms of these types; the
//! concrete model client and facade implementations live in
//! `brickwise-model` and `brickwise-tools`.

pub mod error;
pub mod model;
pub mod tool;
pub mod types;

pub use error::{BrickError, Result};
pub use model::{
    FinishReason, GenerateConfig, Llm, LlmRequest, LlmResponse, ToolChoice, ToolDeclaration,
};
pub use tool::{declaration, Tool};
pub use types::{Content, FunctionResponseData, Part};
