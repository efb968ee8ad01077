//! Text-to-speech through a local GPT-SoVITS style HTTP service.

pub mod client;

use async_trait::async_trait;

use crate::core::models::AudioArtifact;
use crate::errors::PipelineError;

pub use client::TtsClient;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// # Errors
    ///
    /// `InvalidInput` for empty text, `Synthesis` when the service fails or
    /// returns no audio, `Timeout` when the call exceeds its deadline.
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, PipelineError>;
}
