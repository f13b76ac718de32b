//! WebDAV-style storage backend.

use reqwest::StatusCode;
use tracing::{debug, info};
use url::Url;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::Storage;

/// Storage on a WebDAV file server with basic auth.
///
/// Downloads buffer the whole blob before returning, so the caller never
/// holds a half-read connection to the server.
pub struct WebDavStorage {
    http: reqwest::Client,
    base_url: Url,
    root: String,
    username: String,
    password: String,
}

impl WebDavStorage {
    pub fn new(
        base_url: &str,
        root: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> StorageResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StorageError::config(format!("invalid WebDAV url: {e}")))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            root: root.into(),
            username: username.into(),
            password: password.into(),
        })
    }

    fn object_url(&self, path: &str) -> StorageResult<Url> {
        let full = join_path(&self.root, path);
        self.base_url
            .join(full.trim_start_matches('/'))
            .map_err(|e| StorageError::config(format!("invalid object path {path}: {e}")))
    }

    fn classify(status: StatusCode, path: &str) -> StorageError {
        match status {
            StatusCode::NOT_FOUND => StorageError::not_found(path),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                StorageError::auth(format!("{status} for {path}"))
            }
            StatusCode::INSUFFICIENT_STORAGE => {
                StorageError::QuotaExceeded(format!("{status} for {path}"))
            }
            other => StorageError::transport(format!("unexpected status {other} for {path}")),
        }
    }
}

#[async_trait]
impl Storage for WebDavStorage {
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let url = self.object_url(path)?;
        debug!(path = %path, "downloading from WebDAV");

        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| StorageError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify(response.status(), path));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::transport(e.to_string()))?
            .to_vec();

        info!(path = %path, bytes = data.len(), "downloaded blob");
        Ok(data)
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let url = self.object_url(path)?;
        info!(path = %path, bytes = data.len(), "uploading to WebDAV");

        let response = self
            .http
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::classify(response.status(), path));
        }

        Ok(())
    }
}

fn join_path(root: &str, path: &str) -> String {
    format!(
        "{}/{}",
        root.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
