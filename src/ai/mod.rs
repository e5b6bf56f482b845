//! AI model integration for poem recommendation
//!
//! Provides a provider-agnostic interface over OpenAI's Chat Completions
//! API and Google's Gemini generateContent API. Both providers take the
//! same prompt value, including an optional inline photo, and return the
//! model's raw recommendation text.

pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::GeminiPoemClient;
pub use mock::MockPoemClient;
pub use openai::OpenAiPoemClient;

use async_trait::async_trait;

use crate::models::{AiProvider, Config, PoemPrompt};
use crate::Result;

#[async_trait]
pub trait PoemModelService: Send + Sync {
    /// Sends one recommendation prompt and returns the raw model text.
    async fn recommend_poem(&self, prompt: &PoemPrompt) -> Result<String>;
}

/// Builds the configured provider's client. `client` is shared so every
/// outbound call reuses one connection pool.
pub fn client_from_config(config: &Config, client: reqwest::Client) -> Box<dyn PoemModelService> {
    match config.provider {
        AiProvider::OpenAi => {
            tracing::info!("Poem provider: OpenAI (model: {})", config.model);
            Box::new(OpenAiPoemClient::new_with_client(
                config.api_key().to_string(),
                config.model.clone(),
                client,
            ))
        }
        AiProvider::Gemini => {
            tracing::info!("Poem provider: Gemini (model: {})", config.model);
            Box::new(GeminiPoemClient::new_with_client(
                config.api_key().to_string(),
                config.model.clone(),
                client,
            ))
        }
    }
}
