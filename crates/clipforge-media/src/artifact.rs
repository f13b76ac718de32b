//! Owning handle for a processed rendition on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::MediaResult;

/// A processed video on disk. The underlying temp file is deleted when the
/// handle is dropped, so every return path in the caller cleans up.
#[derive(Debug)]
pub struct ProcessedVideo {
    path: PathBuf,
    format: String,
    duration: Duration,
    metadata: HashMap<String, String>,
}

impl ProcessedVideo {
    pub fn new(
        path: PathBuf,
        format: impl Into<String>,
        duration: Duration,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            path,
            format: format.into(),
            duration,
            metadata,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Read the whole rendition into memory.
    pub async fn read_bytes(&self) -> MediaResult<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}

impl Drop for ProcessedVideo {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %self.path.display(), error = %e, "failed to remove artifact");
            }
        }
    }
}
