//! Cloudinary upload API client.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use reshub_core::upload::DEFAULT_UPLOAD_FOLDER;
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::config::{require_var, ConfigError};
use crate::storage::{BlobUploader, StorageError, UploadOptions, UploadRequest, UploadedBlob};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Digest used for request signatures. Cloudinary verifies SHA-1 unless the
/// request names another algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Value of the `signature_algorithm` upload parameter, when one is sent.
    fn request_param(self) -> Option<&'static str> {
        match self {
            Self::Sha1 => None,
            Self::Sha256 => Some("sha256"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder every upload is placed in.
    pub folder: String,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryConfig {
    /// | Env Var                          | Required | Default     |
    /// |----------------------------------|----------|-------------|
    /// | `CLOUDINARY_CLOUD_NAME`          | **yes**  | --          |
    /// | `CLOUDINARY_API_KEY`             | **yes**  | --          |
    /// | `CLOUDINARY_API_SECRET`          | **yes**  | --          |
    /// | `UPLOAD_FOLDER`                  | no       | `resources` |
    /// | `CLOUDINARY_SIGNATURE_ALGORITHM` | no       | `sha1`      |
    pub fn from_env() -> Result<Self, ConfigError> {
        let signature_algorithm = match std::env::var("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Ok(value) if !value.trim().is_empty() => SignatureAlgorithm::parse(&value).ok_or(
                ConfigError::Invalid {
                    var: "CLOUDINARY_SIGNATURE_ALGORITHM",
                    value,
                },
            )?,
            _ => SignatureAlgorithm::default(),
        };

        Ok(Self {
            cloud_name: require_var("CLOUDINARY_CLOUD_NAME")?,
            api_key: require_var("CLOUDINARY_API_KEY")?,
            api_secret: require_var("CLOUDINARY_API_SECRET")?,
            folder: std::env::var("UPLOAD_FOLDER")
                .ok()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string()),
            signature_algorithm,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    resource_type: Option<String>,
}

/// Signed uploads to Cloudinary.
pub struct CloudinaryUploader {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn upload_url(&self, resource_type: &str) -> String {
        format!("{API_BASE}/{}/{resource_type}/upload", self.config.cloud_name)
    }
}

/// The string Cloudinary expects to be hashed: the signed parameters sorted
/// by name as `k=v` pairs joined with `&`, followed by the API secret.
fn string_to_sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{joined}{api_secret}")
}

/// Hex request signature over [`string_to_sign`].
fn sign(params: &[(&str, &str)], api_secret: &str, algorithm: SignatureAlgorithm) -> String {
    let raw = string_to_sign(params, api_secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(raw.as_bytes())),
        SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(raw.as_bytes())),
    }
}

#[async_trait]
impl BlobUploader for CloudinaryUploader {
    async fn upload(
        &self,
        request: UploadRequest,
        folder: &str,
        options: UploadOptions,
    ) -> Result<UploadedBlob, StorageError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let part = multipart::Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(&request.content_type)?;
        let mut form = multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);
        if let Some(algorithm) = self.config.signature_algorithm.request_param() {
            form = form.text("signature_algorithm", algorithm);
        }
        let form = form.part("file", part);

        let response = self
            .client
            .post(self.upload_url(&options.resource_type))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::Rejected { status, body });
        }

        let body: UploadResponse = response.json().await?;
        let secure_url = body.secure_url.ok_or(StorageError::MissingUrl)?;
        tracing::debug!(url = %secure_url, folder, "Blob uploaded");

        Ok(UploadedBlob {
            secure_url,
            resource_type: body.resource_type,
        })
    }
}
