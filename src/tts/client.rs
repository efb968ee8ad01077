use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info};

use super::SpeechSynthesizer;
use crate::ai::client::truncate_chars;
use crate::core::config::{ReferenceSample, TtsSettings};
use crate::core::models::{AudioArtifact, Stage};
use crate::errors::PipelineError;
use crate::net::http_client;

/// Client for the local synthesis service. The reference sample was
/// validated at startup; its absolute path is sent with every request.
#[derive(Debug, Clone)]
pub struct TtsClient {
    settings: TtsSettings,
    reference: ReferenceSample,
}

impl TtsClient {
    #[must_use]
    pub fn new(settings: TtsSettings, reference: ReferenceSample) -> Self {
        Self {
            settings,
            reference,
        }
    }

    /// Query parameters for one synthesis call, in the order the service
    /// documents them.
    #[must_use]
    pub fn query(&self, text: &str) -> Vec<(&'static str, String)> {
        vec![
            ("text", text.to_string()),
            ("text_lang", self.settings.text_lang.clone()),
            (
                "ref_audio_path",
                self.reference.path().to_string_lossy().into_owned(),
            ),
            ("prompt_lang", self.settings.prompt_lang.clone()),
            ("text_split_method", self.settings.text_split_method.clone()),
            ("batch_size", self.settings.batch_size.to_string()),
            ("media_type", self.settings.media_type.clone()),
            ("streaming_mode", "false".to_string()),
        ]
    }

    fn timeout_error(&self) -> PipelineError {
        PipelineError::Timeout {
            stage: Stage::Synthesizing,
            seconds: self.settings.timeout_secs,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> PipelineError {
        if e.is_timeout() {
            return self.timeout_error();
        }
        let e = e.without_url();
        error!("Voice API request failed: {}", e);
        PipelineError::Synthesis(format!("Voice API request failed: {e}"))
    }
}

#[async_trait]
impl SpeechSynthesizer for TtsClient {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let client = http_client(Duration::from_secs(self.settings.timeout_secs))?;

        info!(
            url = %self.settings.url,
            text_lang = %self.settings.text_lang,
            media_type = %self.settings.media_type,
            chars = text.chars().count(),
            "Sending request to voice API"
        );

        let response = client
            .get(&self.settings.url)
            .query(&self.query(text))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                "Voice API returned an error: {}",
                truncate_chars(&body, 300)
            );
            return Err(PipelineError::Synthesis(format!(
                "Voice API returned HTTP {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        if bytes.is_empty() {
            return Err(PipelineError::Synthesis(
                "Voice API returned an empty audio body".to_string(),
            ));
        }

        info!(bytes = bytes.len(), "Successfully received audio data from voice API");
        Ok(AudioArtifact::new(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn client_with_sample() -> (TtsClient, tempfile::NamedTempFile) {
        let mut sample = tempfile::NamedTempFile::new().unwrap();
        sample.write_all(b"RIFF....WAVE").unwrap();
        let reference = ReferenceSample::open(sample.path()).unwrap();
        (TtsClient::new(TtsSettings::default(), reference), sample)
    }

    #[test]
    fn query_carries_absolute_reference_path() {
        let (client, _sample) = client_with_sample();
        let query = client.query("hello");
        let get = |k: &str| {
            query
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(get("text"), "hello");
        assert_eq!(get("text_lang"), "zh");
        assert_eq!(get("text_split_method"), "cut5");
        assert_eq!(get("batch_size"), "1");
        assert_eq!(get("media_type"), "wav");
        assert_eq!(get("streaming_mode"), "false");
        assert!(std::path::Path::new(&get("ref_audio_path")).is_absolute());
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_any_call() {
        let (client, _sample) = client_with_sample();
        let err = client.synthesize("  \n").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }
}
