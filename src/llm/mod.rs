pub mod openai;

pub use openai::{MockChatClient, MockReply, OpenAiClient};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM provider unreachable at {0}")]
    Connection(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),

    #[error("LLM provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Malformed LLM response: {0}")]
    ResponseParsing(String),

    #[error("LLM response contained no choices")]
    EmptyResponse,
}

/// Sampling parameters for a single generation call.
///
/// SQL generation runs near-deterministic with a small budget; insight
/// synthesis runs warmer with room for prose.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for LLM text generation. The pipeline only ever needs
/// prompt-in, text-out; model selection lives in the client.
pub trait ChatClient: Send + Sync {
    fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, LlmError>;
}

/// Connection settings for an OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}
