#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pagecast::ai::gateway::{ProviderGateway, SummarizationProvider};
use pagecast::ai::prompt_builder::PromptTemplate;
use pagecast::core::models::{AudioArtifact, ExtractedDocument, PromptPayload, ProviderId, Source};
use pagecast::errors::PipelineError;
use pagecast::extract::ContentExtractor;
use pagecast::tts::SpeechSynthesizer;
use pagecast::worker::Pipeline;

pub struct FakeExtractor {
    pub text: String,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, source: &Source) -> Result<ExtractedDocument, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.text.trim().is_empty() {
            return Err(pagecast::errors::ExtractionError::Empty.into());
        }
        Ok(ExtractedDocument {
            raw_text: self.text.clone(),
            source_url: source.describe(),
        })
    }
}

pub struct FakeProvider {
    pub id: ProviderId,
    pub reply: Result<String, fn() -> PipelineError>,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn ok(id: ProviderId, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(id: ProviderId, err: fn() -> PipelineError) -> Arc<Self> {
        Arc::new(Self {
            id,
            reply: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SummarizationProvider for FakeProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn summarize(&self, _payload: &PromptPayload) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

pub struct FakeSynthesizer {
    pub audio: Result<Vec<u8>, fn() -> PipelineError>,
    pub calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn ok(bytes: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            audio: Ok(bytes.to_vec()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: fn() -> PipelineError) -> Arc<Self> {
        Arc::new(Self {
            audio: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<AudioArtifact, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.audio {
            Ok(bytes) => Ok(AudioArtifact::new(bytes.clone())),
            Err(make) => Err(make()),
        }
    }
}

pub fn template() -> PromptTemplate {
    PromptTemplate::new("You summarize webpages.", "Summarize:\n{{text}}").unwrap()
}

pub fn pipeline(
    extractor: Arc<FakeExtractor>,
    provider: Arc<FakeProvider>,
    synthesizer: Arc<FakeSynthesizer>,
) -> Pipeline {
    Pipeline::new(
        extractor,
        ProviderGateway::new().with_provider(provider),
        synthesizer,
        template(),
    )
}

/// A RIFF header followed by a few samples.
pub const WAV_BYTES: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00\x01\x00\x01\x00";
