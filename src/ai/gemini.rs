//! Google Gemini `generateContent` provider.
//!
//! Length limits: the summary is only capped when `max_output_tokens` is
//! configured (sent as `generationConfig.maxOutputTokens`). Nothing is
//! truncated on our side.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{error, info};

use super::client::{classify_status, estimate_tokens, read_json_response, transport_error};
use super::gateway::SummarizationProvider;
use crate::core::config::ProviderConfig;
use crate::core::models::{PromptPayload, ProviderId};
use crate::errors::{PipelineError, ProviderError};
use crate::net::http_client;

pub struct GeminiProvider {
    config: ProviderConfig,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model_name
        )
    }
}

#[async_trait]
impl SummarizationProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    async fn summarize(&self, payload: &PromptPayload) -> Result<String, PipelineError> {
        let Some(credential) = &self.config.credential else {
            error!("Google API key is missing.");
            return Err(PipelineError::Configuration(
                "Missing Google API key".to_string(),
            ));
        };
        let secret = credential.expose();

        #[cfg(feature = "debug-logs")]
        info!("Using Gemini prompt:\n{:?}", payload);

        info!(
            model = %self.config.model_name,
            estimated_input_tokens = estimate_tokens(&payload.user_prompt),
            "Sending request to Google Gemini API"
        );

        let body = request_body(payload, self.config.max_output_tokens);
        let client = http_client(self.config.timeout)?;
        let response = client
            .post(self.url())
            .header("x-goog-api-key", secret)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(ProviderId::Gemini, e, self.config.timeout, secret))?;

        let json = read_json_response(
            ProviderId::Gemini,
            response,
            self.config.timeout,
            secret,
            refine_error,
        )
        .await?;

        let summary = parse_summary(&json)
            .map_err(|source| PipelineError::provider(ProviderId::Gemini, source))?;
        info!("Successfully received summary from Gemini.");
        Ok(summary)
    }
}

/// Gemini reports a bad key as HTTP 400 with reason `API_KEY_INVALID`.
fn refine_error(status: StatusCode, body: &str, message: String) -> ProviderError {
    if status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID") {
        return ProviderError::Authentication(message);
    }
    classify_status(status, message)
}

#[must_use]
pub fn request_body(payload: &PromptPayload, max_output_tokens: Option<u32>) -> Value {
    let mut generation_config = json!({
        "temperature": 0.0,
        "topP": 1,
        "topK": 1
    });
    if let Some(max) = max_output_tokens {
        generation_config["maxOutputTokens"] = json!(max);
    }

    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": payload.user_prompt }]
        }],
        "generationConfig": generation_config
    });

    if !payload.system_prompt.is_empty() {
        body["system_instruction"] = json!({ "parts": [{ "text": payload.system_prompt }] });
    }

    body
}

/// Extracts the summary from a `generateContent` response.
///
/// # Errors
///
/// `Blocked` when the prompt or candidate was stopped by safety filters,
/// `MalformedResponse` when no text parts are present.
pub fn parse_summary(json: &Value) -> Result<String, ProviderError> {
    let candidate = json
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first());

    let Some(candidate) = candidate else {
        if let Some(reason) = json
            .get("promptFeedback")
            .and_then(|f| f.get("blockReason"))
            .and_then(Value::as_str)
        {
            error!("Gemini request blocked. Reason: {}", reason);
            return Err(ProviderError::Blocked(reason.to_string()));
        }
        return Err(ProviderError::MalformedResponse(
            "Gemini returned an empty or invalid response".to_string(),
        ));
    };

    let text: String = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let finish = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN");
        if matches!(finish, "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION") {
            return Err(ProviderError::Blocked(finish.to_string()));
        }
        return Err(ProviderError::MalformedResponse(format!(
            "candidate has no text parts (finishReason {finish})"
        )));
    }

    Ok(text)
}
