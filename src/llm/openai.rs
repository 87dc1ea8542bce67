use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{ChatClient, GenerationParams, LlmConfig, LlmError};

/// HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config: LlmConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
        }
    }

    /// Whether an API key is present. Reported by the health endpoint;
    /// the key value itself never leaves this struct.
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub fn key_length(&self) -> usize {
        self.config.api_key.len()
    }
}

/// Request body for /v1/chat/completions.
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from /v1/chat/completions.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl ChatClient for OpenAiClient {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.config.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_secs)
                } else {
                    LlmError::ResponseParsing(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
        Ok(choice.message.content.trim().to_string())
    }
}

/// Scripted reply for `MockChatClient`.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(String),
}

/// Mock chat client for testing. Replies are consumed in order; the last
/// reply repeats once the script runs out, so a single-reply mock behaves
/// like a fixed responder.
pub struct MockChatClient {
    replies: Mutex<VecDeque<MockReply>>,
}

impl MockChatClient {
    pub fn new(response: &str) -> Self {
        Self::sequence(vec![MockReply::Text(response.to_string())])
    }

    pub fn failing(message: &str) -> Self {
        Self::sequence(vec![MockReply::Fail(message.to_string())])
    }

    pub fn sequence(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

impl ChatClient for MockChatClient {
    fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, LlmError> {
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(message)) => Err(LlmError::Connection(message)),
            None => Err(LlmError::EmptyResponse),
        }
    }
}
