//! Blob storage abstraction for attachment uploads.
//!
//! Supports local filesystem, a remote HTTP blob store, and S3-compatible
//! object storage. Only upload is exposed: blobs are never listed or deleted
//! by the application.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::{AppError, AppResult};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Local {
        /// Base path for stored files.
        base_path: PathBuf,
        /// Base URL for serving files.
        base_url: String,
    },
    /// Remote blob store accepting `PUT {endpoint}/{key}`.
    Remote {
        /// Upload endpoint; the key is appended as a path.
        endpoint: String,
        /// Public URL prefix files are resolved from after upload.
        public_url: String,
        /// Bearer token sent with each upload.
        #[serde(default)]
        token: Option<String>,
    },
    /// S3-compatible object storage.
    S3 {
        /// S3 endpoint URL (e.g., "<https://s3.amazonaws.com>" or `MinIO` URL).
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS region.
        region: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Public URL prefix for serving files.
        #[serde(default)]
        public_url: Option<String>,
        /// Path prefix within the bucket.
        #[serde(default)]
        prefix: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            base_path: PathBuf::from("./files"),
            base_url: "/files".to_string(),
        }
    }
}

/// Uploaded blob metadata.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the file.
    pub url: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a blob under `key`.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
    -> AppResult<UploadedFile>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Build the configured storage backend.
pub async fn build_storage(config: &StorageConfig) -> AppResult<Arc<dyn StorageBackend>> {
    match config {
        StorageConfig::Local {
            base_path,
            base_url,
        } => Ok(Arc::new(LocalStorage::new(
            base_path.clone(),
            base_url.clone(),
        ))),
        StorageConfig::Remote {
            endpoint,
            public_url,
            token,
        } => Ok(Arc::new(RemoteStorage::new(
            endpoint.clone(),
            public_url.clone(),
            token.clone(),
        ))),
        #[cfg(feature = "s3")]
        StorageConfig::S3 {
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            public_url,
            prefix,
        } => Ok(Arc::new(
            S3Storage::new(
                endpoint,
                bucket.clone(),
                region,
                access_key_id,
                secret_access_key,
                public_url.clone(),
                prefix.clone(),
            )
            .await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { .. } => Err(AppError::Config(
            "S3 storage requires the `s3` feature".to_string(),
        )),
    }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Upload(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to write file: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Remote HTTP blob store backend.
///
/// Each upload is a single `PUT` of the raw bytes; the store is expected to
/// make the blob readable under `public_url/key` once the request succeeds.
pub struct RemoteStorage {
    client: reqwest::Client,
    endpoint: String,
    public_url: String,
    token: Option<String>,
}

impl RemoteStorage {
    /// Create a new remote storage backend.
    #[must_use]
    pub fn new(endpoint: String, public_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            public_url,
            token,
        }
    }

    fn upload_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), key)
    }
}

#[async_trait::async_trait]
impl StorageBackend for RemoteStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        let mut request = self
            .client
            .put(self.upload_url(key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data.to_vec());

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AppError::Upload(format!("Remote upload failed: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), key)
    }
}

/// S3-compatible object storage backend.
#[cfg(feature = "s3")]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: Option<String>,
    prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Storage {
    /// Create a new S3 storage backend.
    pub async fn new(
        endpoint: &str,
        bucket: String,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        public_url: Option<String>,
        prefix: Option<String>,
    ) -> AppResult<Self> {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "coursedesk");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(endpoint)
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket,
            public_url,
            prefix,
        })
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<UploadedFile> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("S3 upload failed: {e}")))?;

        Ok(UploadedFile {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        let full_key = self.full_key(key);
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), full_key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, full_key),
        }
    }
}
