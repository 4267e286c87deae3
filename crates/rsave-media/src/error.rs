//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media fetching and audio extraction.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    /// The platform reported the video cannot be served (private,
    /// deleted, geo-blocked). Retrying will not help.
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited by platform: {0}")]
    RateLimited(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Video contains no audio stream")]
    NoAudioStream,

    #[error("Extracted audio file is empty")]
    EmptyAudio,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an FFprobe failure error.
    pub fn ffprobe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::FfprobeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Whether retrying the operation could plausibly succeed.
    ///
    /// Rate limits, IO errors and generic download failures are
    /// transient. Unavailable videos, missing audio streams and
    /// missing binaries are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MediaError::RateLimited(_) | MediaError::Io(_) | MediaError::DownloadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(MediaError::RateLimited("429".into()).is_transient());
        assert!(MediaError::download_failed("network reset").is_transient());

        assert!(!MediaError::Unavailable("private video".into()).is_transient());
        assert!(!MediaError::NoAudioStream.is_transient());
        assert!(!MediaError::YtDlpNotFound.is_transient());
        assert!(!MediaError::EmptyAudio.is_transient());
    }
}
