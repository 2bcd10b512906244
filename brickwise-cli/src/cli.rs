use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brickwise")]
#[command(about = "Question answering over building metadata, Brick models and sensor data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question and print the answer
    Ask(AskArgs),
}

#[derive(Args)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Building metadata JSON file
    #[arg(long, env = "BRICKWISE_METADATA", default_value = "data/metadata.json")]
    pub metadata_file: PathBuf,

    /// Directory with per-building Turtle files
    #[arg(long, env = "BRICKWISE_TTL_DIR", default_value = "data/ttl_files")]
    pub ttl_dir: PathBuf,

    /// Connection string for the sensor database
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// API key for the model provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Model identifier
    #[arg(long, default_value = "gpt-4o")]
    pub model: String,

    /// Override the provider base URL (OpenAI-compatible endpoints)
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Row cap for query results without an explicit LIMIT
    #[arg(long, default_value_t = 5)]
    pub top_k: usize,

    /// Step ceiling per run
    #[arg(long, default_value_t = 25)]
    pub max_steps: usize,

    /// Print node-level progress while the run executes
    #[arg(long)]
    pub stream: bool,
}
