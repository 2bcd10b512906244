mod cli;

use anyhow::{Context, Result};
use brickwise_agent::{AgentConfig, BuildingAssistant};
use brickwise_graph::StreamEvent;
use brickwise_model::{OpenAiClient, OpenAiConfig};
use brickwise_tools::PgDatabase;
use clap::Parser;
use cli::{AskArgs, Cli, Commands};
use futures::StreamExt;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ask(args) => ask(args).await,
    }
}

async fn ask(args: AskArgs) -> Result<()> {
    let config = AgentConfig::new(&args.metadata_file, &args.ttl_dir)
        .with_model(&args.model)
        .with_top_k(args.top_k)
        .with_max_steps(args.max_steps);

    let mut provider = OpenAiConfig::new(&args.api_key, &args.model);
    if let Some(base_url) = &args.base_url {
        provider = provider.with_base_url(base_url);
    }
    let llm = Arc::new(OpenAiClient::new(provider)?);

    let database = PgDatabase::connect(&args.database_url)
        .await
        .context("connecting to the sensor database")?;

    let assistant = BuildingAssistant::new(config, llm, Arc::new(database))?;

    if args.stream {
        let mut stream = Box::pin(assistant.run_stream(&args.question)?);
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::NodeStart { node, step } => {
                    eprintln!("[{step}] {node} ...");
                }
                StreamEvent::NodeEnd { node, duration_ms, .. } => {
                    eprintln!("      {node} done in {duration_ms} ms");
                }
                StreamEvent::Custom { node, payload } => {
                    eprintln!("      {node}: {payload}");
                }
                StreamEvent::Done { state, total_steps } => {
                    eprintln!("run finished after {total_steps} steps");
                    let messages =
                        brickwise_agent::messages::history(state.get("messages"))?;
                    if let Some(answer) = brickwise_agent::messages::final_answer(&messages) {
                        println!("{answer}");
                    }
                }
            }
        }
    } else {
        let answer = assistant.run(&args.question).await?;
        println!("{answer}");
    }

    Ok(())
}
