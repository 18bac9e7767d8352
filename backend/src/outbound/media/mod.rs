//! Cloudinary media host adapter.
//!
//! Signed uploads: the request signature is SHA-256 over the sorted
//! parameter string with the API secret appended, per Cloudinary's signing
//! scheme.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::domain::ports::{MediaHost, MediaHostError, MediaKind, UploadedAsset};

const UPLOAD_FOLDER: &str = "lms";

/// Cloudinary-backed implementation of the `MediaHost` port.
pub struct CloudinaryMediaHost {
    http: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl CloudinaryMediaHost {
    /// Build a client against the production endpoint.
    pub fn new(
        http: reqwest::Client,
        cloud_name: String,
        api_key: String,
        api_secret: String,
    ) -> Self {
        Self::with_base_url(
            http,
            "https://api.cloudinary.com".to_owned(),
            cloud_name,
            api_key,
            api_secret,
        )
    }

    /// Build a client against a custom endpoint (used in tests).
    pub fn with_base_url(
        http: reqwest::Client,
        base_url: String,
        cloud_name: String,
        api_key: String,
        api_secret: String,
    ) -> Self {
        Self {
            http,
            base_url,
            cloud_name,
            api_key,
            api_secret,
        }
    }

    fn sign(&self, params: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn resource_path(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    async fn upload(
        &self,
        kind: MediaKind,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError> {
        let timestamp = Utc::now().timestamp();
        // Parameters must be signed in alphabetical order.
        let to_sign = format!("folder={UPLOAD_FOLDER}&timestamp={timestamp}");
        let signature = self.sign(&to_sign);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_owned());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", UPLOAD_FOLDER)
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!(
            "{}/v1_1/{}/{}/upload",
            self.base_url,
            self.cloud_name,
            Self::resource_path(kind)
        );
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| MediaHostError::upload(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MediaHostError::upload(format!(
                "media host returned {status}: {body}"
            )));
        }

        #[derive(Deserialize)]
        struct UploadResponse {
            secure_url: String,
            public_id: String,
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|err| MediaHostError::upload(format!("bad response: {err}")))?;
        Ok(UploadedAsset {
            url: uploaded.secure_url,
            external_id: uploaded.public_id,
        })
    }
}

#[async_trait]
impl MediaHost for CloudinaryMediaHost {
    async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError> {
        self.upload(MediaKind::Image, filename, bytes).await
    }

    async fn upload_video(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, MediaHostError> {
        self.upload(MediaKind::Video, filename, bytes).await
    }

    async fn delete(&self, external_id: &str, kind: MediaKind) -> Result<(), MediaHostError> {
        let timestamp = Utc::now().timestamp();
        let to_sign = format!("public_id={external_id}&timestamp={timestamp}");
        let signature = self.sign(&to_sign);

        let form = reqwest::multipart::Form::new()
            .text("public_id", external_id.to_owned())
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!(
            "{}/v1_1/{}/{}/destroy",
            self.base_url,
            self.cloud_name,
            Self::resource_path(kind)
        );
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| MediaHostError::delete(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(MediaHostError::delete(format!(
                "media host returned {status}"
            )));
        }
        Ok(())
    }
}
