use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::ai::prompt_builder::sanitize_custom_prompt;
use crate::errors::PipelineError;
use crate::extract::fetch::validate_source_url;

/// Identifies a summarization backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProviderId {
    /// Google Gemini (the primary provider).
    #[default]
    Gemini,
    /// OpenRouter chat completions (the secondary provider).
    OpenRouter,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Gemini, ProviderId::OpenRouter];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "primary" => Ok(Self::Gemini),
            "openrouter" | "secondary" => Ok(Self::OpenRouter),
            other => Err(PipelineError::InvalidInput(format!(
                "Unsupported provider: {other}"
            ))),
        }
    }
}

/// Pipeline stages in execution order. Ordering is used to keep
/// transitions forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Received,
    Extracting,
    Prompting,
    Summarizing,
    Synthesizing,
    Encoding,
    Done,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Extracting => "extracting",
            Self::Prompting => "prompting",
            Self::Summarizing => "summarizing",
            Self::Synthesizing => "synthesizing",
            Self::Encoding => "encoding",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An RSS item reference. Embedded `content` wins over fetching `link`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl FeedItem {
    #[must_use]
    pub fn embedded_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    /// Feed item with either embedded content or a validated link.
    FeedItem { item: FeedItem, link: Option<Url> },
}

impl Source {
    /// The URL to fetch, or `None` when the source carries its own content.
    #[must_use]
    pub fn fetch_url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            Self::FeedItem { item, link } => {
                if item.embedded_content().is_some() {
                    None
                } else {
                    link.as_ref()
                }
            }
        }
    }

    /// Human-readable origin used as `ExtractedDocument::source_url`.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.to_string(),
            Self::FeedItem { item, link } => link
                .as_ref()
                .map(ToString::to_string)
                .or_else(|| item.title.clone())
                .unwrap_or_else(|| "feed-item".to_string()),
        }
    }
}

/// JSON body accepted by `POST /summarize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub feed_item: Option<FeedItem>,
    #[serde(default, alias = "summarizer_choice")]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// A validated request. Constructed once, never mutated.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    id: String,
    source: Source,
    provider_id: ProviderId,
    custom_prompt: Option<String>,
}

impl SummarizationRequest {
    /// Validates an inbound payload. No network access happens here, so a
    /// rejected source never reaches the extractor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when both or neither source forms are present,
    /// when a URL is not http(s), when the provider is unsupported, or when
    /// the custom prompt is rejected.
    pub fn from_inbound(inbound: InboundRequest) -> Result<Self, PipelineError> {
        let provider_id = match inbound.provider_id.as_deref() {
            Some(raw) => raw.parse()?,
            None => ProviderId::default(),
        };

        let url = inbound.url.filter(|u| !u.trim().is_empty());
        let source = match (url, inbound.feed_item) {
            (Some(_), Some(_)) => {
                return Err(PipelineError::InvalidInput(
                    "Provide exactly one of 'url' or 'feed_item'".to_string(),
                ));
            }
            (None, None) => {
                return Err(PipelineError::InvalidInput(
                    "Missing 'url' in request data".to_string(),
                ));
            }
            (Some(raw), None) => Source::Url(validate_source_url(&raw)?),
            (None, Some(item)) => {
                let link = match item.link.as_deref().filter(|l| !l.trim().is_empty()) {
                    Some(raw) => Some(validate_source_url(raw)?),
                    None => None,
                };
                if item.embedded_content().is_none() && link.is_none() {
                    return Err(PipelineError::InvalidInput(
                        "Feed item needs either 'content' or a 'link'".to_string(),
                    ));
                }
                Source::FeedItem { item, link }
            }
        };

        let custom_prompt = checked_custom_prompt(inbound.custom_prompt)?;

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            provider_id,
            custom_prompt,
        })
    }

    /// Convenience constructor for a plain URL.
    ///
    /// # Errors
    ///
    /// Same as [`SummarizationRequest::from_inbound`].
    pub fn for_url(url: &str, provider_id: ProviderId) -> Result<Self, PipelineError> {
        Self::from_inbound(InboundRequest {
            url: Some(url.to_string()),
            provider_id: Some(provider_id.as_str().to_string()),
            ..InboundRequest::default()
        })
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` if the prompt fails [`sanitize_custom_prompt`].
    pub fn with_custom_prompt(
        mut self,
        custom_prompt: Option<String>,
    ) -> Result<Self, PipelineError> {
        self.custom_prompt = checked_custom_prompt(custom_prompt)?;
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn source(&self) -> &Source {
        &self.source
    }

    #[must_use]
    pub fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    #[must_use]
    pub fn custom_prompt(&self) -> Option<&str> {
        self.custom_prompt.as_deref()
    }
}

fn checked_custom_prompt(raw: Option<String>) -> Result<Option<String>, PipelineError> {
    match raw.filter(|p| !p.trim().is_empty()) {
        Some(prompt) => sanitize_custom_prompt(&prompt)
            .map(Some)
            .map_err(PipelineError::InvalidInput),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub raw_text: String,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub summary_text: String,
    pub provider_id: ProviderId,
}

/// Raw audio returned by the synthesis service, kept in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
}

impl AudioArtifact {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Decodes a transport string back into audio bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the string is not valid standard base64.
    pub fn from_base64(encoded: &str) -> Result<Self, PipelineError> {
        STANDARD
            .decode(encoded)
            .map(Self::new)
            .map_err(|e| PipelineError::InvalidInput(format!("Invalid base64 audio: {e}")))
    }
}

impl fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioArtifact")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Everything a successful run produces. `audio_base64` is the transport
/// encoding of `audio`, produced by the encoding stage.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub summary: SummaryResult,
    pub audio: AudioArtifact,
    pub audio_base64: String,
}

/// Success body returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary_text: String,
    pub audio_base64: String,
}

impl From<&PipelineOutput> for SummarizeResponse {
    fn from(output: &PipelineOutput) -> Self {
        Self {
            summary_text: output.summary.summary_text.clone(),
            audio_base64: output.audio_base64.clone(),
        }
    }
}

/// Failure body returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}
