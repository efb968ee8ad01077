//! OpenRouter chat-completions provider.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{error, info};

use super::client::{
    classify_status, estimate_tokens, read_json_response, transport_error, upstream_message,
};
use super::gateway::SummarizationProvider;
use crate::core::config::ProviderConfig;
use crate::core::models::{PromptPayload, ProviderId};
use crate::errors::{PipelineError, ProviderError, redact};
use crate::net::http_client;

pub struct OpenRouterProvider {
    config: ProviderConfig,
    referer: Option<String>,
    title: String,
}

impl OpenRouterProvider {
    #[must_use]
    pub fn new(config: ProviderConfig, referer: Option<String>, title: String) -> Self {
        Self {
            config,
            referer,
            title,
        }
    }
}

#[async_trait]
impl SummarizationProvider for OpenRouterProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenRouter
    }

    async fn summarize(&self, payload: &PromptPayload) -> Result<String, PipelineError> {
        let Some(credential) = &self.config.credential else {
            error!("OpenRouter API key is missing.");
            return Err(PipelineError::Configuration(
                "Missing OpenRouter API key".to_string(),
            ));
        };
        let secret = credential.expose();

        #[cfg(feature = "debug-logs")]
        info!("Using OpenRouter prompt:\n{:?}", payload);

        info!(
            model = %self.config.model_name,
            estimated_input_tokens = estimate_tokens(&payload.user_prompt),
            "Sending request to OpenRouter API"
        );

        let body = request_body(
            &self.config.model_name,
            payload,
            self.config.max_output_tokens,
        );
        let client = http_client(self.config.timeout)?;
        let mut request = client
            .post(&self.config.endpoint)
            .bearer_auth(secret)
            .header("X-Title", &self.title)
            .json(&body);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(ProviderId::OpenRouter, e, self.config.timeout, secret))?;

        let json = read_json_response(
            ProviderId::OpenRouter,
            response,
            self.config.timeout,
            secret,
            |status: StatusCode, _body: &str, message| classify_status(status, message),
        )
        .await?;

        let summary = parse_summary(&json).map_err(|source| {
            PipelineError::provider(ProviderId::OpenRouter, redact_source(source, secret))
        })?;
        info!("Successfully received summary from OpenRouter.");
        Ok(summary)
    }
}

fn redact_source(source: ProviderError, secret: &str) -> ProviderError {
    match source {
        ProviderError::Upstream { status, message } => ProviderError::Upstream {
            status,
            message: redact(&message, secret),
        },
        ProviderError::Authentication(message) => {
            ProviderError::Authentication(redact(&message, secret))
        }
        ProviderError::RateLimited(message) => ProviderError::RateLimited(redact(&message, secret)),
        other => other,
    }
}

#[must_use]
pub fn request_body(model: &str, payload: &PromptPayload, max_output_tokens: Option<u32>) -> Value {
    let mut messages = Vec::with_capacity(2);
    if !payload.system_prompt.is_empty() {
        messages.push(json!({ "role": "system", "content": payload.system_prompt }));
    }
    messages.push(json!({ "role": "user", "content": payload.user_prompt }));

    let mut body = json!({
        "model": model,
        "messages": messages
    });
    if let Some(max) = max_output_tokens {
        body["max_tokens"] = json!(max);
    }
    body
}

/// Extracts `choices[0].message.content`.
///
/// OpenRouter can answer HTTP 200 with an `error` object when the routed
/// model fails. Its `code` is classified like an HTTP status; a missing or
/// unknown code is treated as a bad gateway.
///
/// # Errors
///
/// The classified embedded error, or `MalformedResponse` when no content is
/// present.
pub fn parse_summary(json: &Value) -> Result<String, ProviderError> {
    if let Some(err) = json.get("error") {
        let status = err
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .and_then(|c| StatusCode::from_u16(c).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let message = upstream_message(&json.to_string());
        error!(status = status.as_u16(), "OpenRouter returned an embedded error");
        return Err(classify_status(status, message));
    }

    json.get("choices")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            ProviderError::MalformedResponse(
                "OpenRouter response has no choices[0].message.content".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let json = json!({
            "id": "gen-1",
            "choices": [{ "message": { "role": "assistant", "content": "A summary." } }]
        });
        assert_eq!(parse_summary(&json).unwrap(), "A summary.");
    }

    #[test]
    fn embedded_error_is_upstream() {
        let json = json!({ "error": { "code": 503, "message": "No endpoints available" } });
        match parse_summary(&json) {
            Err(ProviderError::Upstream { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "No endpoints available");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn embedded_quota_error_is_rate_limited() {
        let json = json!({ "error": { "code": 429, "message": "Rate limit exceeded" } });
        assert!(matches!(
            parse_summary(&json),
            Err(ProviderError::RateLimited(m)) if m == "Rate limit exceeded"
        ));
        let json = json!({ "error": { "code": 402, "message": "Insufficient credits" } });
        assert!(matches!(parse_summary(&json), Err(ProviderError::RateLimited(_))));
    }

    #[test]
    fn embedded_auth_error_is_authentication() {
        let json = json!({ "error": { "code": 401, "message": "User not found" } });
        assert!(matches!(
            parse_summary(&json),
            Err(ProviderError::Authentication(m)) if m == "User not found"
        ));
    }

    #[test]
    fn embedded_error_without_code_is_bad_gateway() {
        let json = json!({ "error": { "message": "Provider returned error" } });
        assert!(matches!(
            parse_summary(&json),
            Err(ProviderError::Upstream { status: 502, .. })
        ));
    }

    #[test]
    fn empty_choices_is_malformed() {
        assert!(matches!(
            parse_summary(&json!({ "choices": [] })),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn system_message_omitted_when_empty() {
        let payload = PromptPayload {
            system_prompt: String::new(),
            user_prompt: "u".into(),
        };
        let body = request_body("m", &payload, None);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert!(body.get("max_tokens").is_none());

        let payload = PromptPayload {
            system_prompt: "s".into(),
            user_prompt: "u".into(),
        };
        let body = request_body("m", &payload, Some(100));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["max_tokens"], 100);
    }
}
