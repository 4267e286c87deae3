//! Error types for the OpenAI clients.

use thiserror::Error;

/// Result type for ML client operations.
pub type MlResult<T> = Result<T, MlError>;

/// Errors from transcription and analysis calls.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Audio file too large: {size_bytes} bytes (limit {limit_bytes})")]
    AudioTooLarge { size_bytes: u64, limit_bytes: u64 },

    #[error("Transcript is empty")]
    EmptyTranscript,

    /// The transcript carries no recipe. A content outcome, not an
    /// infrastructure error; never retried.
    #[error("no recipe detected")]
    NoRecipeDetected,

    #[error("OpenAI rate limited: {0}")]
    RateLimited(String),

    #[error("OpenAI API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The model returned output that does not match the requested
    /// JSON contract.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MlError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Whether retrying the call could plausibly succeed.
    ///
    /// Rate limits, transport errors and 5xx responses are transient.
    /// Oversized audio, empty transcripts, content outcomes and 4xx
    /// responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            MlError::RateLimited(_) | MlError::Http(_) | MlError::Io(_) => true,
            MlError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
