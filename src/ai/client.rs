//! HTTP plumbing shared by the summarization providers.
//!
//! Every provider call builds its own client with the provider's timeout
//! (see [`crate::net::http_client`]).

use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::core::models::{ProviderId, Stage};
use crate::errors::{PipelineError, ProviderError, redact};

/// Longest upstream error text forwarded to the caller.
const MAX_FORWARDED_ERROR_CHARS: usize = 300;

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// Maps a transport-level reqwest error. URLs are stripped and the secret is
/// redacted before the message can reach a log line or the caller.
#[must_use]
pub fn transport_error(
    provider: ProviderId,
    error: reqwest::Error,
    timeout: Duration,
    secret: &str,
) -> PipelineError {
    if error.is_timeout() {
        return PipelineError::Timeout {
            stage: Stage::Summarizing,
            seconds: timeout.as_secs(),
        };
    }
    let message = redact(&error.without_url().to_string(), secret);
    PipelineError::provider(provider, ProviderError::Network(message))
}

/// Generic status classification. Providers refine it where their API has
/// its own conventions.
#[must_use]
pub fn classify_status(status: StatusCode, message: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Authentication(message),
        402 | 429 => ProviderError::RateLimited(message),
        code => ProviderError::Upstream {
            status: code,
            message,
        },
    }
}

/// Pulls `error.message` out of a JSON error body, falling back to the raw
/// (truncated) text.
#[must_use]
pub fn upstream_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    });
    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return "no error details".to_string();
    }
    truncate_chars(&message, MAX_FORWARDED_ERROR_CHARS)
}

#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Reads a provider response into JSON, turning non-2xx statuses into
/// classified provider errors.
///
/// # Errors
///
/// Returns a `Provider` error for non-success statuses or undecodable
/// bodies, and `Timeout` if reading the body exceeds the deadline.
pub async fn read_json_response(
    provider: ProviderId,
    response: Response,
    timeout: Duration,
    secret: &str,
    refine: impl Fn(StatusCode, &str, String) -> ProviderError,
) -> Result<Value, PipelineError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e, timeout, secret))?;

    if !status.is_success() {
        let message = redact(&upstream_message(&body), secret);
        warn!(provider = %provider, status = status.as_u16(), "Provider returned an error status");
        return Err(PipelineError::provider(
            provider,
            refine(status, &body, message),
        ));
    }

    serde_json::from_str(&body).map_err(|e| {
        PipelineError::provider(
            provider,
            ProviderError::MalformedResponse(format!("response is not JSON: {e}")),
        )
    })
}
