use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Completion response contained no text")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, LLMError>;

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Single-shot completion
    ///
    /// # Arguments
    /// * `system_prompt` - Instruction sent as the system message
    /// * `user_prompt` - Rendered step prompt sent as the user message
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
