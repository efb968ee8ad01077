use axum::http::StatusCode;
use std::error::Error;

use pagecast::core::models::{ProviderId, Stage};
use pagecast::errors::{ExtractionError, PipelineError, ProviderError, redact};

#[test]
fn test_pipeline_error_implements_error_trait() {
    fn assert_error<T: Error + Send + Sync + 'static>(_: &T) {}

    let error = PipelineError::InvalidInput("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_pipeline_error_display() {
    let error = PipelineError::InvalidInput("Missing 'url' in request data".to_string());
    assert_eq!(
        format!("{error}"),
        "Invalid input: Missing 'url' in request data"
    );

    let error = PipelineError::Timeout {
        stage: Stage::Synthesizing,
        seconds: 300,
    };
    assert_eq!(
        format!("{error}"),
        "Stage 'synthesizing' timed out after 300 seconds"
    );

    let error = PipelineError::provider(
        ProviderId::OpenRouter,
        ProviderError::RateLimited("slow down".into()),
    );
    assert_eq!(
        format!("{error}"),
        "Summarization provider openrouter failed: rate limit or quota exceeded: slow down"
    );
}

#[test]
fn test_status_codes_by_error_class() {
    let cases = [
        (PipelineError::InvalidInput(String::new()), StatusCode::BAD_REQUEST, "invalid_input"),
        (ExtractionError::Empty.into(), StatusCode::UNPROCESSABLE_ENTITY, "extraction_failure"),
        (
            PipelineError::provider(ProviderId::Gemini, ProviderError::Blocked("SAFETY".into())),
            StatusCode::BAD_GATEWAY,
            "provider_failure",
        ),
        (PipelineError::Synthesis(String::new()), StatusCode::BAD_GATEWAY, "synthesis_failure"),
        (
            PipelineError::Timeout {
                stage: Stage::Extracting,
                seconds: 30,
            },
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
        ),
        (
            PipelineError::Configuration(String::new()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "configuration_error",
        ),
        (
            PipelineError::Internal(String::new()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_failure",
        ),
    ];

    for (error, status, kind) in cases {
        assert_eq!(error.status_code(), status, "{error}");
        assert_eq!(error.kind().as_str(), kind);
    }
}

#[test]
fn test_extraction_error_from_conversion() {
    let err: PipelineError = ExtractionError::Status(404).into();
    match err {
        PipelineError::Extraction(ExtractionError::Status(code)) => assert_eq!(code, 404),
        other => panic!("Unexpected error type: {other:?}"),
    }
}

#[test]
fn test_json_error_becomes_internal() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: PipelineError = parse_err.into();
    assert!(matches!(err, PipelineError::Internal(_)));
    assert_eq!(err.public_message(), "An internal server error occurred");
}

#[test]
fn test_redact_replaces_every_occurrence() {
    let msg = "key sk-123 rejected; retry with sk-123";
    assert_eq!(
        redact(msg, "sk-123"),
        "key [REDACTED] rejected; retry with [REDACTED]"
    );
    assert_eq!(redact(msg, ""), msg);
}
