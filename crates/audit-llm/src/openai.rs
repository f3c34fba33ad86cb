use async_trait::async_trait;
use reqwest::Client;

use crate::provider::{CompletionService, LLMError, Result};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a preconfigured client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
        }
    }
}

#[async_trait]
impl CompletionService for OpenAIProvider {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(LLMError::Auth("OpenAI API key is not set".to_string()));
        }

        let body = self.build_request(system_prompt, user_prompt);
        log::debug!(
            "Sending completion request to {} with model '{}' ({} prompt chars)",
            self.base_url,
            self.model,
            user_prompt.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        let completion: ChatCompletionResponse = serde_json::from_slice(&response.bytes().await?)?;
        let content = completion.first_content().ok_or(LLMError::EmptyResponse)?;

        log::debug!(
            "Received completion: {}...",
            content.chars().take(100).collect::<String>()
        );
        Ok(content)
    }
}
