pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAIProvider;
pub use provider::{CompletionService, LLMError, Result};
pub use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
