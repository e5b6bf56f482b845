use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use image::{imageops::FilterType, ImageFormat};

use super::ImageIngestService;
use crate::models::{ImageAttachment, ImageSource};
use crate::{Error, Result};

/// Attachments above this size get downscaled and re-encoded before being
/// sent to a model.
const MAX_ATTACHMENT_BYTES: usize = 2 * 1024 * 1024;

/// Hard cap on a remote image download, matching the inbound request body
/// limit. Larger photos still fit under [`MAX_ATTACHMENT_BYTES`] through
/// the downscale path; anything over this is refused outright.
const MAX_REMOTE_FETCH_BYTES: usize = 16 * 1024 * 1024;

/// Longest side to start from when downscaling an oversized photo.
const INITIAL_MAX_SIDE: u32 = 1600;

/// Smallest longest-side worth shrinking to.
const MIN_SIDE: u32 = 64;

/// Sniffs the MIME type from magic bytes. Falls back to JPEG since photos
/// are the common case here.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/jpeg",
                &bytes[..bytes.len().min(4)]
            );
            "image/jpeg"
        }
    }
}

pub struct ImageIngestor {
    client: reqwest::Client,
    max_bytes: usize,
    max_fetch_bytes: usize,
    fetch_timeout: Duration,
}

impl ImageIngestor {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_bytes: MAX_ATTACHMENT_BYTES,
            max_fetch_bytes: MAX_REMOTE_FETCH_BYTES,
            fetch_timeout: Duration::from_secs(30),
        }
    }

    #[cfg(test)]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[cfg(test)]
    pub fn with_max_fetch_bytes(mut self, max_fetch_bytes: usize) -> Self {
        self.max_fetch_bytes = max_fetch_bytes;
        self
    }

    #[cfg(test)]
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching remote image from {}", url);
        let mut response = self
            .client
            .get(url)
            .timeout(self.fetch_timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::InvalidRequest(format!(
                "Failed to fetch image (status {})",
                response.status()
            )));
        }
        if let Some(declared) = response.content_length() {
            if declared > self.max_fetch_bytes as u64 {
                return Err(Error::InvalidRequest(format!(
                    "Remote image is {} bytes, over the {} byte download limit",
                    declared, self.max_fetch_bytes
                )));
            }
        }

        // The declared length is advisory; the accumulator enforces the
        // cap even on chunked or mislabeled responses.
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > self.max_fetch_bytes {
                return Err(Error::InvalidRequest(format!(
                    "Remote image exceeds the {} byte download limit",
                    self.max_fetch_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    fn decode_data_url(url: &str) -> Result<Vec<u8>> {
        let payload = url
            .split_once("base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| {
                Error::InvalidRequest("Image data URL is not base64-encoded".to_string())
            })?;
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::InvalidRequest(format!("Invalid base64 image data: {}", e)))
    }

    /// Re-encodes `bytes` as JPEG, halving the longest side until the
    /// result fits in `max_bytes`.
    fn shrink_to_fit_sync(bytes: Vec<u8>, max_bytes: usize) -> Result<Vec<u8>> {
        let img = image::load_from_memory(&bytes)?;
        let longest = img.width().max(img.height());
        let mut target = longest.min(INITIAL_MAX_SIDE);

        loop {
            let resized = img.resize(target, target, FilterType::Lanczos3);
            let mut encoded = Vec::new();
            resized
                .to_rgb8()
                .write_to(&mut std::io::Cursor::new(&mut encoded), ImageFormat::Jpeg)?;
            if encoded.len() <= max_bytes {
                tracing::debug!(
                    "Downscaled image to {}px longest side, {} bytes",
                    target,
                    encoded.len()
                );
                return Ok(encoded);
            }
            if target <= MIN_SIDE {
                return Err(Error::InvalidRequest(
                    "Image is too large to attach even after downscaling".to_string(),
                ));
            }
            target = (target / 2).max(MIN_SIDE);
        }
    }
}

#[async_trait]
impl ImageIngestService for ImageIngestor {
    async fn prepare_attachment(&self, source: &ImageSource) -> Result<ImageAttachment> {
        let bytes = match source {
            ImageSource::DataUrl(url) => Self::decode_data_url(url)?,
            ImageSource::Remote(url) => self.fetch_remote(url).await?,
        };
        if bytes.is_empty() {
            return Err(Error::InvalidRequest(
                "Image reference decoded to zero bytes".to_string(),
            ));
        }

        if bytes.len() <= self.max_bytes {
            let mime = detect_image_mime(&bytes).to_string();
            return Ok(ImageAttachment {
                mime,
                data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            });
        }

        tracing::info!("Image is {} bytes, downscaling before attaching", bytes.len());
        let max_bytes = self.max_bytes;
        let encoded =
            tokio::task::spawn_blocking(move || Self::shrink_to_fit_sync(bytes, max_bytes))
                .await
                .map_err(|e| Error::Invariant(format!("Image downscale task join error: {}", e)))??;

        Ok(ImageAttachment {
            mime: "image/jpeg".to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(&encoded),
        })
    }
}
