//! Object storage adapters.
//!
//! Two interchangeable backends behind one [`Storage`] contract: a
//! WebDAV-style file server and an S3-style bucket. Blobs are opaque; paths
//! are slash-delimited logical strings mapped per backend.

pub mod error;
pub mod s3;
pub mod webdav;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};
pub use s3::{S3Config, S3Storage};
pub use webdav::WebDavStorage;

/// Contract for reading and writing opaque blobs by logical path.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch the blob at `path`. The whole body is buffered in memory.
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Write `data` at `path`, overwriting any existing blob.
    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()>;
}
