//! Worker error types and the failure-reason taxonomy.

use thiserror::Error;

use rsave_media::MediaError;
use rsave_ml_client::MlError;
use rsave_models::PlatformError;
use rsave_store::StoreError;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors that can occur while processing a job.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("ML service error: {0}")]
    Ml(#[from] MlError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Stage '{stage}' timed out after {secs}s")]
    StageTimeout { stage: &'static str, secs: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Create a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether retrying the failed stage could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkerError::Media(e) => e.is_transient(),
            WorkerError::Ml(e) => e.is_transient(),
            WorkerError::StageTimeout { .. } => true,
            WorkerError::Io(_) => true,
            _ => false,
        }
    }

    /// The reason string recorded on the recipe row when this error
    /// terminates a job.
    ///
    /// Reasons distinguish "try a different link" from "try again
    /// later" without leaking internals to users.
    pub fn failure_reason(&self) -> &'static str {
        match self {
            WorkerError::Media(MediaError::Unavailable(_)) => "video unavailable",
            WorkerError::Media(MediaError::NoAudioStream)
            | WorkerError::Media(MediaError::EmptyAudio) => "video has no usable audio",
            WorkerError::Media(MediaError::RateLimited(_)) => {
                "platform is rate limiting downloads, try again later"
            }
            WorkerError::Media(_) => "failed to download video",
            WorkerError::Ml(MlError::NoRecipeDetected) | WorkerError::Ml(MlError::EmptyTranscript) => {
                "no recipe detected"
            }
            WorkerError::Ml(MlError::AudioTooLarge { .. }) => "audio too long to transcribe",
            WorkerError::Ml(MlError::RateLimited(_)) => "service busy, try again later",
            WorkerError::Ml(MlError::MalformedResponse(_)) => "recipe analysis failed",
            WorkerError::Ml(_) => "transcription service error",
            WorkerError::Platform(_) => "unsupported or invalid video URL",
            WorkerError::StageTimeout { .. } => "timed out",
            _ => "internal error",
        }
    }
}
