use axum::http::StatusCode;
use thiserror::Error;

use crate::core::models::{ProviderId, Stage};

/// Why a page could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to fetch page: {0}")]
    Fetch(String),

    #[error("Page returned HTTP status {0}")]
    Status(u16),

    #[error("Unsupported content type: {0}")]
    NotHtml(String),

    #[error("No readable content could be extracted from the page")]
    Empty,
}

/// Failures reported by a summarization provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("request blocked: {0}")]
    Blocked(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Summarization provider {provider} failed: {source}")]
    Provider {
        provider: ProviderId,
        source: ProviderError,
    },

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Stage '{stage}' timed out after {seconds} seconds")]
    Timeout { stage: Stage, seconds: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error class, used for the failed pipeline state and the
/// `kind` field of error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ExtractionFailure,
    ConfigurationError,
    ProviderFailure,
    SynthesisFailure,
    Timeout,
    InternalFailure,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::ExtractionFailure => "extraction_failure",
            Self::ConfigurationError => "configuration_error",
            Self::ProviderFailure => "provider_failure",
            Self::SynthesisFailure => "synthesis_failure",
            Self::Timeout => "timeout",
            Self::InternalFailure => "internal_failure",
        }
    }
}

impl PipelineError {
    #[must_use]
    pub fn provider(provider: ProviderId, source: ProviderError) -> Self {
        Self::Provider { provider, source }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Extraction(_) => ErrorKind::ExtractionFailure,
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::Provider { .. } => ErrorKind::ProviderFailure,
            Self::Synthesis(_) => ErrorKind::SynthesisFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Internal(_) => ErrorKind::InternalFailure,
        }
    }

    /// HTTP status conveying the error class: caller input, upstream
    /// collaborator, or our own failure.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Provider { .. } | Self::Synthesis(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller. Internal failures are
    /// reported generically; the full error is only logged.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "An internal server error occurred".to_string(),
            Self::Configuration(msg) => format!("Server configuration error: {msg}"),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(error: serde_json::Error) -> Self {
        PipelineError::Internal(format!("JSON error: {error}"))
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(error: tokio::task::JoinError) -> Self {
        PipelineError::Internal(format!("Task failed: {error}"))
    }
}

/// Replaces every occurrence of `secret` in `message`.
#[must_use]
pub fn redact(message: &str, secret: &str) -> String {
    if secret.is_empty() {
        return message.to_string();
    }
    message.replace(secret, "[REDACTED]")
}
