//! HTTP client construction shared by every stage that goes over the wire.

use reqwest::Client;
use std::time::Duration;

use crate::errors::PipelineError;

/// Builds a fresh client bounded by `timeout`. Idle connections are not
/// kept between requests.
///
/// # Errors
///
/// Returns `Internal` if the TLS backend cannot be initialised.
pub fn http_client(timeout: Duration) -> Result<Client, PipelineError> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()
        .map_err(|e| PipelineError::Internal(format!("Failed to build HTTP client: {e}")))
}
