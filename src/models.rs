//! Data models and structures
//!
//! Defines the request/response contracts of the recommendation endpoint,
//! the provider-agnostic prompt handed to model clients, and the runtime
//! configuration loaded from the environment.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Incoming poem recommendation request.
///
/// Mirrors the JSON body the web client posts to `/recommend`. Every field
/// is optional on the wire; the service enforces that at least one user
/// signal (image, story, or mood tag) is present before calling the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoemRequest {
    /// Opaque image reference: either an inline `data:` URL or the URL of
    /// an externally hosted image.
    pub image_url: Option<String>,
    /// Free-text story behind the photo. Older clients send `queryText`.
    #[serde(alias = "queryText")]
    pub story: Option<String>,
    /// Short label for the desired emotional register, e.g. "그리움".
    pub mood_tag: Option<String>,
    /// Calm-to-excited scale from 0 to 10. Older clients send `emotionValue`.
    #[serde(alias = "emotionValue")]
    pub emotion_score: Option<f32>,
    /// How many policy-rejected answers the caller has already seen for
    /// this request.
    pub retry_count: u32,
}

impl PoemRequest {
    /// True when the request carries at least one usable user signal.
    /// Whitespace-only text counts as absent; an emotion score alone is
    /// not enough to prompt on.
    pub fn has_user_context(&self) -> bool {
        self.image_source().is_some()
            || non_blank(self.story.as_deref()).is_some()
            || non_blank(self.mood_tag.as_deref()).is_some()
    }

    /// Classified image reference, if one was supplied.
    pub fn image_source(&self) -> Option<ImageSource> {
        non_blank(self.image_url.as_deref()).map(ImageSource::from_reference)
    }
}

/// Trims `value` and drops it entirely when nothing is left.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Successful response body. The raw model text is returned verbatim and
/// split into poem fields on the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub poem_text: String,
}

/// Where an image reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:<mime>;base64,<payload>` URL produced by the client's
    /// file picker.
    DataUrl(String),
    /// Externally hosted image that has to be fetched before prompting.
    Remote(String),
}

impl ImageSource {
    pub fn from_reference(reference: &str) -> Self {
        if reference.starts_with("data:") {
            ImageSource::DataUrl(reference.to_string())
        } else {
            ImageSource::Remote(reference.to_string())
        }
    }
}

/// Inline image data ready to attach to a model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// MIME type of the encoded bytes, e.g. `image/jpeg`.
    pub mime: String,
    /// Standard base64 encoding of the image bytes.
    pub data: String,
}

impl ImageAttachment {
    /// Renders the attachment as a `data:` URL for APIs that take one.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.data)
    }
}

/// Provider-agnostic prompt for a single poem recommendation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoemPrompt {
    /// System instructions describing the recommendation rules.
    pub system: String,
    /// User turn built from the story, mood tag, and emotion score.
    pub user_text: String,
    /// Photo to ground the recommendation in, when one was supplied.
    pub image: Option<ImageAttachment>,
}

/// Supported generative AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
}

impl AiProvider {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::OpenAi),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(Error::Config(format!(
                "Unknown provider '{}'. Expected 'openai' or 'gemini'",
                other
            ))),
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o",
            AiProvider::Gemini => "gemini-2.0-flash",
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: AiProvider,
    pub model: String,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider = match std::env::var("POEM_PROVIDER") {
            Ok(value) => AiProvider::parse(&value)?,
            Err(_) => AiProvider::OpenAi,
        };
        let model = std::env::var("POEM_MODEL")
            .unwrap_or_else(|_| provider.default_model().to_string());

        let config = Self {
            provider,
            model,
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: match std::env::var("SERVER_PORT") {
                Ok(value) => value
                    .parse()
                    .map_err(|_| Error::Config(format!("Invalid SERVER_PORT '{}'", value)))?,
                Err(_) => 3001,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let missing = match self.provider {
            AiProvider::OpenAi if self.openai_api_key.is_none() => Some("OPENAI_API_KEY"),
            AiProvider::Gemini if self.gemini_api_key.is_none() => Some("GEMINI_API_KEY"),
            _ => None,
        };
        match missing {
            Some(var) => Err(Error::Config(format!("{} not set", var))),
            None => Ok(()),
        }
    }

    /// API key for the configured provider.
    pub fn api_key(&self) -> &str {
        match self.provider {
            AiProvider::OpenAi => self
                .openai_api_key
                .as_deref()
                .expect("OPENAI_API_KEY validated in Config::from_env"),
            AiProvider::Gemini => self
                .gemini_api_key
                .as_deref()
                .expect("GEMINI_API_KEY validated in Config::from_env"),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
