//! Poem recommendation orchestration
//!
//! Coordinates image ingestion, prompt construction, the model call, and
//! the copyright policy check with its single strict retry.

use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::{self, PoemModelService};
use crate::image::{ImageIngestService, ImageIngestor};
use crate::models::{Config, PoemRequest};
use crate::poem::parse_poem_response;
use crate::prompts::{self, Strictness};
use crate::{policy, Error, Result};

/// Coordinates one poem recommendation end to end.
pub struct RecommendService {
    model: Box<dyn PoemModelService>,
    images: Box<dyn ImageIngestService>,
}

impl RecommendService {
    /// Build a service from concrete dependencies.
    ///
    /// This is primarily useful for tests that need to inject mocks.
    pub fn with_services(
        model: Box<dyn PoemModelService>,
        images: Box<dyn ImageIngestService>,
    ) -> Self {
        Self { model, images }
    }

    /// Build a service from runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        // One HTTP connection pool, with a 30 second deadline, shared by
        // the model client and remote image fetches.
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        let model = ai::client_from_config(config, http_client.clone());
        let images = Box::new(ImageIngestor::new(http_client));
        Self::with_services(model, images)
    }

    /// Produces the raw recommendation text for `request`.
    ///
    /// The flow is bounded: one model call, plus at most one strict retry
    /// when the answer trips the copyright check. A request that has
    /// already been retried [`policy::POLICY_RETRY_CAP`] times gets a
    /// policy error instead of another model call.
    pub async fn recommend(&self, request: &PoemRequest) -> Result<String> {
        let request_id = Uuid::new_v4();

        if !request.has_user_context() {
            warn!("[{}] Request carries no usable context", request_id);
            return Err(Error::MissingInput);
        }

        let image = match request.image_source() {
            Some(source) => {
                let attachment = self.images.prepare_attachment(&source).await?;
                info!(
                    "[{}] Prepared {} attachment ({} base64 chars)",
                    request_id,
                    attachment.mime,
                    attachment.data.len()
                );
                Some(attachment)
            }
            None => None,
        };

        info!(
            "[{}] Requesting recommendation (retry_count: {})",
            request_id, request.retry_count
        );
        let prompt = prompts::recommendation(request, image.clone(), Strictness::Standard);
        let text = self.model.recommend_poem(&prompt).await?;

        if !policy::flags_ownership_concern(&text) {
            self.log_outcome(request_id, &text);
            return Ok(text);
        }

        if request.retry_count >= policy::POLICY_RETRY_CAP {
            warn!(
                "[{}] Copyright concern persists after {} client retries, giving up",
                request_id, request.retry_count
            );
            return Err(Error::PolicyExhausted);
        }

        warn!(
            "[{}] Answer flagged for copyright concerns, retrying with strict instructions",
            request_id
        );
        let strict_prompt = prompts::recommendation(request, image, Strictness::Strict);
        let retried = self.model.recommend_poem(&strict_prompt).await?;

        if policy::flags_ownership_concern(&retried) {
            warn!(
                "[{}] Strict retry is still flagged, returning its text anyway",
                request_id
            );
        }
        self.log_outcome(request_id, &retried);
        Ok(retried)
    }

    fn log_outcome(&self, request_id: Uuid, text: &str) {
        let poem = parse_poem_response(text);
        if poem.is_empty() {
            warn!(
                "[{}] Answer did not match the expected poem layout ({} chars)",
                request_id,
                text.len()
            );
        } else {
            info!(
                "[{}] Recommended '{}' by {}",
                request_id, poem.title, poem.author
            );
        }
    }
}
