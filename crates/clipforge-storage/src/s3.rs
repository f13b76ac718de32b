//! S3-style storage backend.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};
use crate::Storage;

/// Connection parameters for the S3 backend.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Static credentials; empty values fall back to the default chain.
    pub access_key: String,
    pub secret_key: String,
    /// Custom endpoint for S3-compatible stores (forces path-style addressing).
    pub endpoint: Option<String>,
    /// Prefix prepended to upload keys.
    pub key_prefix: String,
}

/// Storage on an S3 bucket or S3-compatible store.
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        if config.bucket.is_empty() {
            return Err(StorageError::config("S3 bucket is required"));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if !config.access_key.is_empty() && !config.secret_key.is_empty() {
            loader = loader.credentials_provider(Credentials::new(
                &config.access_key,
                &config.secret_key,
                None,
                None,
                "static",
            ));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "S3 storage initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket,
            prefix: config.key_prefix,
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let key = download_key(path);
        debug!(bucket = %self.bucket, key = %key, "downloading from S3");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let text = e.to_string();
                if text.contains("NoSuchKey") {
                    StorageError::not_found(&key)
                } else if text.contains("AccessDenied") {
                    StorageError::auth(text)
                } else {
                    StorageError::transport(text)
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::transport(e.to_string()))?
            .into_bytes()
            .to_vec();

        info!(bucket = %self.bucket, key = %key, bytes = data.len(), "downloaded blob");
        Ok(data)
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> StorageResult<()> {
        let key = upload_key(&self.prefix, path);
        info!(bucket = %self.bucket, key = %key, bytes = data.len(), "uploading to S3");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                let text = e.to_string();
                if text.contains("AccessDenied") {
                    StorageError::auth(text)
                } else {
                    StorageError::transport(text)
                }
            })?;

        Ok(())
    }
}

/// The object key for a download drops the first logical segment, which the
/// upload API uses as a per-container namespace.
fn download_key(path: &str) -> String {
    let mut segments = path.split('/');
    segments.next();
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        path.to_string()
    } else {
        rest.join("/")
    }
}

fn upload_key(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", prefix.trim_end_matches('/'), path)
    }
}
