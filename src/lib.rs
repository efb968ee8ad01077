//! pagecast - turns a webpage into a spoken summary.
//!
//! A request flows through five stages, each with its own module:
//! 1. `extract` fetches the page and keeps only its readable text
//! 2. `ai::prompt_builder` wraps the text in the configured prompt
//! 3. `ai::gateway` sends the prompt to Gemini or OpenRouter
//! 4. `tts` turns the summary into audio with a local voice service
//! 5. `worker::pipeline` sequences the above and base64-encodes the audio
//!
//! `api` exposes the pipeline over HTTP for the browser extension; the
//! `pagecast` binary runs it once from the command line.
//!
//! # Example
//!
//! ```no_run
//! use pagecast::core::config::AppConfig;
//! use pagecast::core::models::{ProviderId, SummarizationRequest};
//! use pagecast::worker::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pagecast::setup_logging();
//!
//!     let config = AppConfig::load(None)?;
//!     let pipeline = Pipeline::from_config(&config);
//!
//!     let request =
//!         SummarizationRequest::for_url("https://example.com/post", ProviderId::Gemini)?;
//!     let output = pipeline.run(&request).await?;
//!     println!("Summary: {}", output.summary.summary_text);
//!     println!("Audio: {} bytes", output.audio.len());
//!     Ok(())
//! }
//! ```
pub mod ai;
pub mod api;
pub mod core;
pub mod errors;
pub mod extract;
pub mod net;
pub mod tts;
pub mod worker;

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Configure structured logging with JSON output for the API server.
///
/// The level comes from `RUST_LOG` and defaults to `info`. Calling this
/// more than once is harmless.
///
/// # Example
///
/// ```
/// pagecast::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init();
}

/// Human-readable logging for interactive use.
pub fn setup_cli_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        env_filter()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
