use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PoemModelService;
use crate::models::PoemPrompt;
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_completion_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<ChatMessageContent>,
}

/// Untagged union of the two content shapes the chat API accepts: a plain
/// string, or a list of typed parts for multimodal messages.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ChatMessageContent {
    Text(String),
    Parts(Vec<MessagePart>),
}

#[derive(Debug, Serialize, Deserialize)]
struct MessagePart {
    #[serde(rename = "type")]
    part_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<ImageUrl>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct OpenAiPoemClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiPoemClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn build_request(&self, prompt: &PoemPrompt) -> ChatCompletionRequest {
        let system_message = ChatMessage {
            role: "system".to_string(),
            content: Some(ChatMessageContent::Text(prompt.system.clone())),
        };

        let user_content = match &prompt.image {
            Some(image) => ChatMessageContent::Parts(vec![
                MessagePart {
                    part_type: "text".to_string(),
                    text: Some(prompt.user_text.clone()),
                    image_url: None,
                },
                MessagePart {
                    part_type: "image_url".to_string(),
                    text: None,
                    image_url: Some(ImageUrl {
                        url: image.to_data_url(),
                    }),
                },
            ]),
            None => ChatMessageContent::Text(prompt.user_text.clone()),
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                system_message,
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user_content),
                },
            ],
            max_completion_tokens: 1000,
        }
    }
}

#[async_trait]
impl PoemModelService for OpenAiPoemClient {
    async fn recommend_poem(&self, prompt: &PoemPrompt) -> Result<String> {
        let request = self.build_request(prompt);
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to OpenAI: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("OpenAI API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "OpenAI API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse OpenAI response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse OpenAI response: {}", e))
        })?;

        parsed
            .choices
            .first()
            .and_then(|choice| match &choice.message.content {
                Some(ChatMessageContent::Text(text)) => Some(text.clone()),
                _ => None,
            })
            .ok_or_else(|| Error::AiProvider("No text in OpenAI chat response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageAttachment;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer, api_key: &str, model: &str) -> OpenAiPoemClient {
        OpenAiPoemClient::new(api_key.to_string(), model.to_string()).with_base_url(server.uri())
    }

    fn text_prompt() -> PoemPrompt {
        PoemPrompt {
            system: "시를 추천하세요.".to_string(),
            user_text: "분위기: 그리움".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_recommend_poem_parses_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "서시\n윤동주\n죽는 날까지 하늘을 우러러\n시집"
                    },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "test-key", "gpt-4o");

        let text = client.recommend_poem(&text_prompt()).await.unwrap();
        assert_eq!(text, "서시\n윤동주\n죽는 날까지 하늘을 우러러\n시집");
    }

    #[tokio::test]
    async fn test_recommend_poem_sends_configured_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("\"model\":\"custom-model\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "시" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "key", "custom-model");

        client.recommend_poem(&text_prompt()).await.unwrap();
    }

    #[tokio::test]
    async fn test_recommend_poem_attaches_image_as_data_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("image_url"))
            .and(body_string_contains("data:image/jpeg;base64,aGVsbG8="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "시" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "key", "gpt-4o");

        let prompt = PoemPrompt {
            image: Some(ImageAttachment {
                mime: "image/jpeg".to_string(),
                data: "aGVsbG8=".to_string(),
            }),
            ..text_prompt()
        };
        client.recommend_poem(&prompt).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", "gpt-4o");

        let err = client.recommend_poem(&text_prompt()).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[tokio::test]
    async fn test_recommend_poem_rejects_empty_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "key", "gpt-4o");

        let err = client.recommend_poem(&text_prompt()).await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
