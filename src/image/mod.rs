//! Image ingestion for vision prompts
//!
//! Turns the image reference on an incoming request (an inline `data:` URL
//! or a remote photo URL) into base64 data small enough to attach to a
//! model call, downscaling oversized photos on the way.

pub mod ingest;
pub mod mock;

pub use ingest::{detect_image_mime, ImageIngestor};
pub use mock::MockImageIngestor;

use async_trait::async_trait;

use crate::models::{ImageAttachment, ImageSource};
use crate::Result;

#[async_trait]
pub trait ImageIngestService: Send + Sync {
    /// Resolves an image reference into an attachment ready for a model
    /// prompt.
    async fn prepare_attachment(&self, source: &ImageSource) -> Result<ImageAttachment>;
}
