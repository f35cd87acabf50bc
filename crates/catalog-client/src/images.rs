//! Cover image downloads for release attachments.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use releasesync_core::errors::{Error, SyncError};
use releasesync_core::releases::{FetchedImage, ImageFetcher};
use reqwest::header::CONTENT_TYPE;

use crate::error::{CatalogClientError, Result};

/// Largest image body accepted for attachment.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Downloads images over HTTP, rejecting non-image and oversized bodies.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn download(&self, url: &str) -> Result<FetchedImage> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogClientError::api(
                status.as_u16(),
                format!("Image download failed with {}", status),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or_default().trim().to_string())
            .unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(CatalogClientError::unexpected(format!(
                "Not an image (content-type '{}')",
                content_type
            )));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(CatalogClientError::unexpected(format!(
                    "Image is {} bytes, limit is {}",
                    len, self.max_bytes
                )));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(CatalogClientError::unexpected(format!(
                    "Image exceeds {} bytes, limit is {}",
                    bytes.len() + chunk.len(),
                    self.max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        if bytes.is_empty() {
            return Err(CatalogClientError::unexpected("Image body is empty"));
        }

        debug!(
            "[ReleaseSync] Downloaded image {} ({}, {} bytes)",
            url,
            content_type,
            bytes.len()
        );
        Ok(FetchedImage {
            content_type,
            bytes,
        })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> releasesync_core::Result<FetchedImage> {
        self.download(url)
            .await
            .map_err(|err| Error::Sync(SyncError::image_attach(url, err.to_string())))
    }
}
