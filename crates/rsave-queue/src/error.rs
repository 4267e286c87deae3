//! Error types for queue operations.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors from the job queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A dequeued payload failed to parse. The job is dropped rather
    /// than requeued; a payload that never parses would loop forever.
    #[error("Malformed job payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}
