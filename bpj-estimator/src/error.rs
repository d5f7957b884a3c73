use thiserror::Error;

pub type Result<T> = std::result::Result<T, EstimateError>;

/// Failure categories surfaced to callers of [`crate::EstimatorClient`].
///
/// Upstream detail for `Service` failures is logged, never surfaced; the
/// caller gets a generic message and must resubmit to retry.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(
        "Gemini API key is missing; set keys.gemini_api_key or the GEMINI_API_KEY environment variable"
    )]
    MissingApiKey,

    #[error("the configured Gemini API key is not valid; check your credentials")]
    InvalidApiKey,

    #[error("received an empty response from the AI; try rephrasing the project description")]
    EmptyResponse,

    #[error("unexpected estimation format: {0}")]
    Parse(String),

    #[error("failed to get an estimation from the AI service; please try again later")]
    Service,
}

impl From<serde_json::Error> for EstimateError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
