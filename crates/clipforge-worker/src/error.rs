//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("task processing timed out after {0:?}")]
    ProcessingTimeout(Duration),

    #[error("queue error: {0}")]
    Queue(#[from] clipforge_queue::QueueError),

    #[error("storage error: {0}")]
    Storage(#[from] clipforge_storage::StorageError),

    #[error("database error: {0}")]
    Db(#[from] clipforge_db::DbError),

    #[error("media error: {0}")]
    Media(#[from] clipforge_media::MediaError),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn metrics(msg: impl Into<String>) -> Self {
        Self::Metrics(msg.into())
    }
}
