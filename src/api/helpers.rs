//! Response builders shared by the API handlers.

use axum::Json;
use axum::http::StatusCode;
use tracing::error;

use crate::core::models::ErrorResponse;
use crate::errors::{ErrorKind, PipelineError};

/// Maps a pipeline error to its status and caller-facing body. Internal
/// details are logged here and replaced by a generic message.
#[must_use]
pub fn err_response(err: &PipelineError) -> (StatusCode, Json<ErrorResponse>) {
    if matches!(err, PipelineError::Internal(_)) {
        error!("Internal failure: {}", err);
    }
    (
        err.status_code(),
        Json(ErrorResponse {
            error: err.public_message(),
            kind: err.kind().as_str().to_string(),
        }),
    )
}

/// 400 for a body that never made it into a request.
#[must_use]
pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
            kind: ErrorKind::InvalidInput.as_str().to_string(),
        }),
    )
}
