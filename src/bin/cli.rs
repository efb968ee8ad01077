use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use pagecast::core::config::AppConfig;
use pagecast::core::models::{ProviderId, SummarizationRequest};
use pagecast::worker::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "pagecast", version, about = "Summarize a webpage and save the spoken summary")]
struct Args {
    /// Page to summarize (http or https)
    url: String,

    /// Summarization provider: gemini (primary) or openrouter (secondary)
    #[arg(short, long, default_value = "gemini")]
    provider: String,

    /// Path to pagecast.yaml
    #[arg(short, long, env = "PAGECAST_CONFIG")]
    config: Option<PathBuf>,

    /// Where to write the audio (defaults to summary.<media_type>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra style instruction appended to the system prompt
    #[arg(long)]
    custom_prompt: Option<String>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    pagecast::setup_cli_logging(args.verbose);

    let provider: ProviderId = args.provider.parse()?;
    let request = SummarizationRequest::for_url(&args.url, provider)
        .and_then(|request| request.with_custom_prompt(args.custom_prompt))
        .context("Invalid request")?;

    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("summary.{}", config.tts.media_type)));
    let pipeline = Pipeline::from_config(&config);

    let output = pipeline.run(&request).await.context("Summarization failed")?;

    println!("{}", output.summary.summary_text);

    tokio::fs::write(&output_path, output.audio.bytes())
        .await
        .with_context(|| format!("Failed to write audio to {}", output_path.display()))?;
    info!(
        "Saved {} bytes of audio to {}",
        output.audio.len(),
        output_path.display()
    );
    eprintln!("Audio saved to {}", output_path.display());
    Ok(())
}
