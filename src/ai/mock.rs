use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::PoemModelService;
use crate::models::PoemPrompt;
use crate::{Error, Result};

/// In-memory stand-in for a model client. Queued responses are served in
/// order and cycle when exhausted; every prompt is recorded so tests can
/// assert what the service actually sent.
///
/// Clones share state, so tests can keep a probe handle after boxing.
#[derive(Clone)]
pub struct MockPoemClient {
    responses: Arc<Mutex<Vec<String>>>,
    recorded_prompts: Arc<Mutex<Vec<PoemPrompt>>>,
    call_count: Arc<Mutex<usize>>,
    fail: Arc<Mutex<bool>>,
}

impl MockPoemClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            recorded_prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    /// Makes every call fail with a provider error.
    pub fn with_failure(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn recorded_prompts(&self) -> Vec<PoemPrompt> {
        self.recorded_prompts.lock().unwrap().clone()
    }
}

impl Default for MockPoemClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PoemModelService for MockPoemClient {
    async fn recommend_poem(&self, prompt: &PoemPrompt) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.recorded_prompts.lock().unwrap().push(prompt.clone());

        if *self.fail.lock().unwrap() {
            return Err(Error::AiProvider("mock provider failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response in the expected layout
            Ok("호수\n정지용\n얼굴 하나야 손바닥 둘로\n푹 가리지만\n\n그리움을 호수에 빗댄 짧은 시입니다.\n정지용 시집".to_string())
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}
