use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

use super::{MediaError, MediaStore, ValidatedImage};
use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Signed uploads to Cloudinary's image upload endpoint.
///
/// Signatures use SHA-256, so the Cloudinary account must have SHA-256
/// signing enabled.
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    folder: String,
    http: reqwest::Client,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig, folder: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            config,
            folder: folder.to_string(),
            http,
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", API_BASE, self.config.cloud_name)
    }
}

/// Hex SHA-256 over `k=v` pairs sorted by key and joined with `&`, followed by the secret.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn store(&self, image: ValidatedImage) -> Result<String, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let params = [
            ("folder", self.folder.clone()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let filename = format!("upload.{}", image.extension());
        let file = Part::bytes(image.bytes)
            .file_name(filename)
            .mime_str(image.mime_type)
            .map_err(|e| MediaError::Provider(e.to_string()))?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.folder.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "cloudinary upload request failed");
                MediaError::Provider(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            tracing::warn!(status = %status, detail = %detail, "cloudinary rejected upload");
            return Err(MediaError::Provider(detail));
        }

        let body = response.json::<UploadResponse>().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse cloudinary response");
            MediaError::Provider(e.to_string())
        })?;

        Ok(body.secure_url)
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
