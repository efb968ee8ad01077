use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;

use pagecast::api::{ApiState, serve};
use pagecast::core::config::AppConfig;
use pagecast::worker::Pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "pagecast-api",
    version,
    about = "HTTP API that turns webpages into spoken summaries"
)]
struct Args {
    /// Path to pagecast.yaml
    #[arg(short, long, env = "PAGECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pagecast::setup_logging();
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let bind = args.bind.unwrap_or_else(|| config.bind.clone());
    let state = ApiState::new(Pipeline::from_config(&config));

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    serve(listener, state).await.context("Server error")?;
    Ok(())
}
