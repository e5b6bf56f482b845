use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ImageIngestService;
use crate::models::{ImageAttachment, ImageSource};
use crate::Result;

/// Clones share state, so tests can keep a probe handle after boxing.
#[derive(Clone)]
pub struct MockImageIngestor {
    attachment: Arc<Mutex<ImageAttachment>>,
    recorded_sources: Arc<Mutex<Vec<ImageSource>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockImageIngestor {
    pub fn new() -> Self {
        Self {
            attachment: Arc::new(Mutex::new(ImageAttachment {
                mime: "image/jpeg".to_string(),
                data: "bW9jaw==".to_string(),
            })),
            recorded_sources: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_attachment(self, attachment: ImageAttachment) -> Self {
        *self.attachment.lock().unwrap() = attachment;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_ingest_count(&self) -> usize {
        self.recorded_sources.lock().unwrap().len()
    }

    pub fn recorded_sources(&self) -> Vec<ImageSource> {
        self.recorded_sources.lock().unwrap().clone()
    }
}

impl Default for MockImageIngestor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageIngestService for MockImageIngestor {
    async fn prepare_attachment(&self, source: &ImageSource) -> Result<ImageAttachment> {
        self.recorded_sources.lock().unwrap().push(source.clone());

        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::InvalidRequest(
                "Mock image ingest failure".to_string(),
            ));
        }

        Ok(self.attachment.lock().unwrap().clone())
    }
}
