//! Building-management question answering over three sources: a
//! metadata registry (building codes and locations), per-building
//! Brick models in Turtle, and a sensor timeseries database.
//!
//! A [`BuildingAssistant`] runs each question through a routing graph:
//! the question is evaluated for validity, routed to the structural
//! (RDF) or numeric (SQL) source, and looped through a
//! generate/check/execute cycle until the model produces a final
//! answer or the step ceiling cuts the run short.
//!
//! ```no_run
//! use brickwise_agent::{AgentConfig, BuildingAssistant};
//! use brickwise_tools::StaticSqlSource;
//! use std::sync::Arc;
//!
//! # async fn example(llm: Arc<dyn brickwise_core::Llm>) -> brickwise_core::Result<()> {
//! let config = AgentConfig::new("data/metadata.json", "data/ttl_files");
//! let assistant = BuildingAssistant::new(config, llm, Arc::new(StaticSqlSource::new()))?;
//! let answer = assistant.run("In which city is building BCGW?").await?;
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod config;
pub mod evaluation;
pub mod messages;
pub mod nodes;
pub mod prompts;

pub use assistant::BuildingAssistant;
pub use config::AgentConfig;
pub use evaluation::QueryEvaluation;
