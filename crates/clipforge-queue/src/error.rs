//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    /// Empty poll. Swallowed by the worker loop, never logged as an error.
    #[error("no messages available")]
    NoMessages,

    /// Payload could not be decoded; the broker copy has been deleted.
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("SQS error: {0}")]
    Sqs(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn sqs(msg: impl Into<String>) -> Self {
        Self::Sqs(msg.into())
    }

    /// True for the empty-poll sentinel.
    pub fn is_no_messages(&self) -> bool {
        matches!(self, QueueError::NoMessages)
    }
}
