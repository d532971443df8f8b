//! Blob storage for uploaded resource files.
//!
//! Handlers depend on [`BlobUploader`]; the production implementation is
//! [`cloudinary::CloudinaryUploader`]. Uploaded blobs are never deleted by
//! this server, so the trait has no removal method.

pub mod cloudinary;

use async_trait::async_trait;

/// A file received from the client, ready to be stored.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Per-upload options understood by the storage provider.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Provider asset class (`"image"`, `"video"`, `"raw"`) or `"auto"` to let
    /// the provider detect it.
    pub resource_type: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            resource_type: "auto".to_string(),
        }
    }
}

/// Where a stored blob can be fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedBlob {
    pub secure_url: String,
    /// The asset class the provider assigned, if any.
    pub resource_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage provider rejected the upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("storage provider returned no URL")]
    MissingUrl,
}

#[async_trait]
pub trait BlobUploader: Send + Sync {
    /// Store `request` under `folder` and return its public location.
    async fn upload(
        &self,
        request: UploadRequest,
        folder: &str,
        options: UploadOptions,
    ) -> Result<UploadedBlob, StorageError>;
}
