pub mod coerce;
pub mod fallback;
pub mod normalize;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod retry;
pub mod schema;
pub mod types;

pub use fallback::fallback_document;
pub use normalize::normalize;
pub use openai::*;
pub use orchestrator::*;
pub use prompt::*;
pub use retry::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Model API is not reachable at {0}")]
    Connection(String),

    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    #[error("Model API returned error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("Model API rejected the credentials (status {0})")]
    Unauthorized(u16),

    #[error("No API key configured for the model API")]
    MissingCredentials,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model API response: {0}")]
    MalformedResponse(String),

    #[error("No text to analyze")]
    EmptyInput,
}

impl StructuringError {
    /// Failures worth a fresh request. Only rejected credentials and
    /// missing input are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_)
            | Self::Timeout(_)
            | Self::HttpClient(_)
            | Self::MalformedResponse(_)
            | Self::ApiError { .. } => true,
            Self::Unauthorized(_) | Self::MissingCredentials | Self::EmptyInput => false,
        }
    }

    /// The model capability itself is unusable as configured.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::MissingCredentials)
    }
}
