//! The request pipeline: extract, prompt, summarize, synthesize, encode.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::ai::gateway::ProviderGateway;
use crate::ai::prompt_builder::{self, PromptTemplate};
use crate::core::config::AppConfig;
use crate::core::models::{PipelineOutput, ProviderId, Stage, SummarizationRequest};
use crate::errors::{ErrorKind, PipelineError};
use crate::extract::{ContentExtractor, HttpExtractor};
use crate::tts::{SpeechSynthesizer, TtsClient};

/// Where a run currently is. `Failed` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Active(Stage),
    Failed(ErrorKind),
}

/// Enforces forward-only stage transitions and logs each one with the
/// request id.
#[derive(Debug)]
pub struct StageTracker {
    request_id: String,
    state: RunState,
    started: Instant,
}

impl StageTracker {
    #[must_use]
    pub fn new(request_id: &str) -> Self {
        info!(request_id, stage = %Stage::Received, "Pipeline stage");
        Self {
            request_id: request_id.to_string(),
            state: RunState::Active(Stage::Received),
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// # Errors
    ///
    /// Returns `Internal` for a backwards or repeated transition, or any
    /// transition out of `Failed`.
    pub fn advance(&mut self, next: Stage) -> Result<(), PipelineError> {
        match self.state {
            RunState::Active(current) if next > current => {
                info!(
                    request_id = %self.request_id,
                    from = %current,
                    to = %next,
                    elapsed_ms = self.elapsed_ms(),
                    "Pipeline stage"
                );
                self.state = RunState::Active(next);
                Ok(())
            }
            state => Err(PipelineError::Internal(format!(
                "invalid stage transition from {state:?} to {next}"
            ))),
        }
    }

    /// Records the first failure. Later calls are ignored.
    pub fn fail(&mut self, err: &PipelineError) {
        if let RunState::Active(stage) = self.state {
            error!(
                request_id = %self.request_id,
                stage = %stage,
                kind = err.kind().as_str(),
                elapsed_ms = self.elapsed_ms(),
                "Pipeline failed: {}",
                err
            );
            self.state = RunState::Failed(err.kind());
        }
    }
}

/// Holds the stage clients. Immutable once built, so one instance is shared
/// by every request.
pub struct Pipeline {
    extractor: Arc<dyn ContentExtractor>,
    gateway: ProviderGateway,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    template: PromptTemplate,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        extractor: Arc<dyn ContentExtractor>,
        gateway: ProviderGateway,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            extractor,
            gateway,
            synthesizer,
            template,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(HttpExtractor::new(config.extractor.clone())),
            ProviderGateway::from_config(config),
            Arc::new(TtsClient::new(
                config.tts.clone(),
                config.reference_sample.clone(),
            )),
            config.prompt.clone(),
        )
    }

    #[must_use]
    pub fn providers(&self) -> Vec<ProviderId> {
        self.gateway.provider_ids()
    }

    /// Runs every stage in order and stops at the first failure. Nothing
    /// partial is returned.
    ///
    /// # Errors
    ///
    /// The first stage error, unchanged.
    pub async fn run(
        &self,
        request: &SummarizationRequest,
    ) -> Result<PipelineOutput, PipelineError> {
        info!(
            request_id = request.id(),
            source = %request.source().describe(),
            provider = %request.provider_id(),
            custom_prompt = request.custom_prompt().is_some(),
            "Received summarization request"
        );
        let mut tracker = StageTracker::new(request.id());
        let result = self.execute(request, &mut tracker).await;
        if let Err(err) = &result {
            tracker.fail(err);
        }
        result
    }

    async fn execute(
        &self,
        request: &SummarizationRequest,
        tracker: &mut StageTracker,
    ) -> Result<PipelineOutput, PipelineError> {
        tracker.advance(Stage::Extracting)?;
        let document = self.extractor.extract(request.source()).await?;

        tracker.advance(Stage::Prompting)?;
        let payload = prompt_builder::build(&document, &self.template, request.custom_prompt())?;

        tracker.advance(Stage::Summarizing)?;
        let summary = self
            .gateway
            .summarize(&payload, request.provider_id())
            .await?;
        info!(
            request_id = request.id(),
            provider = %summary.provider_id,
            chars = summary.summary_text.chars().count(),
            "Summary generated"
        );

        tracker.advance(Stage::Synthesizing)?;
        let audio = self.synthesizer.synthesize(&summary.summary_text).await?;
        if audio.is_empty() {
            return Err(PipelineError::Synthesis(
                "synthesizer returned no audio".to_string(),
            ));
        }

        tracker.advance(Stage::Encoding)?;
        let audio_base64 = audio.to_base64();

        tracker.advance(Stage::Done)?;
        Ok(PipelineOutput {
            summary,
            audio,
            audio_base64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_only_move_forward() {
        let mut tracker = StageTracker::new("req-1");
        tracker.advance(Stage::Extracting).unwrap();
        tracker.advance(Stage::Summarizing).unwrap();
        assert!(tracker.advance(Stage::Prompting).is_err());
        assert!(tracker.advance(Stage::Summarizing).is_err());
        assert_eq!(tracker.state(), RunState::Active(Stage::Summarizing));
    }

    #[test]
    fn failed_is_absorbing() {
        let mut tracker = StageTracker::new("req-2");
        tracker.advance(Stage::Extracting).unwrap();
        tracker.fail(&PipelineError::Synthesis("boom".into()));
        assert_eq!(tracker.state(), RunState::Failed(ErrorKind::SynthesisFailure));

        tracker.fail(&PipelineError::InvalidInput("later".into()));
        assert_eq!(tracker.state(), RunState::Failed(ErrorKind::SynthesisFailure));
        assert!(tracker.advance(Stage::Done).is_err());
    }
}
