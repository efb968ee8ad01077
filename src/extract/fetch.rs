//! Page retrieval.

use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::core::config::ExtractorSettings;
use crate::core::models::Stage;
use crate::errors::{ExtractionError, PipelineError};
use crate::net::http_client;

/// Body and declared media type of a fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    /// Lowercased media type without parameters, empty if the header was absent.
    pub media_type: String,
    pub final_url: String,
}

impl FetchedPage {
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.media_type.is_empty()
            || self.media_type == "text/html"
            || self.media_type == "application/xhtml+xml"
    }

    #[must_use]
    pub fn is_plain_text(&self) -> bool {
        self.media_type == "text/plain"
    }
}

/// Accepts only absolute `http`/`https` URLs with a host.
///
/// # Errors
///
/// Returns `InvalidInput` for anything else.
pub fn validate_source_url(raw: &str) -> Result<Url, PipelineError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| PipelineError::InvalidInput(format!("Invalid URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(PipelineError::InvalidInput(format!(
                "Unsupported URL scheme '{other}': only http and https are allowed"
            )));
        }
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(PipelineError::InvalidInput(format!(
            "URL '{raw}' has no host"
        )));
    }

    Ok(url)
}

/// Performs a single GET for `url`.
///
/// # Errors
///
/// `Timeout { stage: Extracting }` when the deadline passes, otherwise an
/// `Extraction` error for transport failures and non-2xx statuses.
pub async fn fetch_page(
    url: &Url,
    settings: &ExtractorSettings,
) -> Result<FetchedPage, PipelineError> {
    let client = http_client(Duration::from_secs(settings.timeout_secs))?;

    info!(url = %url, "Fetching page");
    let response = client
        .get(url.clone())
        .header("User-Agent", &settings.user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.5",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| fetch_error(e, settings.timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "Page returned an error status");
        return Err(ExtractionError::Status(status.as_u16()).into());
    }

    let media_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type_of)
        .unwrap_or_default();
    let final_url = response.url().to_string();

    let body = response
        .text()
        .await
        .map_err(|e| fetch_error(e, settings.timeout_secs))?;

    Ok(FetchedPage {
        body,
        media_type,
        final_url,
    })
}

fn fetch_error(error: reqwest::Error, timeout_secs: u64) -> PipelineError {
    if error.is_timeout() {
        return PipelineError::Timeout {
            stage: Stage::Extracting,
            seconds: timeout_secs,
        };
    }
    ExtractionError::Fetch(error.without_url().to_string()).into()
}

fn media_type_of(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
