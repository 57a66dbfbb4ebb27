//! Error types surfaced by the analysis core

use std::time::Duration;
use thiserror::Error;

/// Errors returned by providers and the analysis service
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Unknown provider type or missing credential. Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote call failed on every attempt of the retry budget
    #[error("Provider call failed after {attempts} attempts: {source}")]
    ProviderCall {
        attempts: u32,
        #[source]
        source: GenerationError,
    },

    /// Remote response could not be read as the expected result
    #[error("Failed to parse provider response: {0}")]
    ResponseParse(String),

    /// Malformed input definition
    #[error("Invalid workflow definition: {0}")]
    Validation(String),

    /// Caller cancelled the in-flight call
    #[error("Analysis cancelled")]
    Cancelled,

    /// Call did not finish within the configured deadline
    #[error("Analysis exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

/// Failure of a single text-generation attempt
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Upstream returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}

impl AnalysisError {
    /// Short machine-readable kind, used in error events
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Configuration(_) => "configuration",
            AnalysisError::ProviderCall { .. } => "provider_call",
            AnalysisError::ResponseParse(_) => "response_parse",
            AnalysisError::Validation(_) => "validation",
            AnalysisError::Cancelled => "cancelled",
            AnalysisError::DeadlineExceeded(_) => "deadline_exceeded",
        }
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
