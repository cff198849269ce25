//! Provider trait and factory for LLM providers

use async_trait::async_trait;

use crate::llm::{
    errors::LlmResult,
    openai::OpenAIProvider,
    types::{ChatRequest, ProviderConfig, ProviderResponse},
};

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and get a response
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse>;

    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model name
    fn model(&self) -> &str;

    /// Validate the configuration
    fn validate_config(&self) -> LlmResult<()>;
}

/// Factory for creating LLM providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a new provider from configuration
    pub fn create_provider(config: ProviderConfig) -> LlmResult<Box<dyn LlmProvider>> {
        let provider = OpenAIProvider::new(config)?;
        provider.validate_config()?;
        Ok(Box::new(provider))
    }
}

/// Provider client options
#[derive(Debug, Clone)]
pub struct ProviderClientOptions {
    pub user_agent: String,
    /// Upper bound on how much of an error body ends up in a message
    pub max_error_body: usize,
}

impl Default for ProviderClientOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("mdchat/", env!("CARGO_PKG_VERSION")).to_string(),
            max_error_body: 300,
        }
    }
}

/// Utility functions for provider implementations
pub mod utils {
    /// Extract a readable message from an error response body.
    ///
    /// OpenAI-style bodies carry `{"error": {"message": ...}}`; anything else is
    /// returned as trimmed text, cut to `limit` characters.
    pub fn extract_error_message(body: &str, limit: usize) -> String {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(message) = json
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
            {
                return truncate(message, limit);
            }
        }

        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            truncate(trimmed, limit)
        }
    }

    fn truncate(text: &str, limit: usize) -> String {
        if text.chars().count() <= limit {
            text.to_string()
        } else {
            let mut cut: String = text.chars().take(limit).collect();
            cut.push('…');
            cut
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_extracts_openai_error_message() {
            let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
            assert_eq!(extract_error_message(body, 300), "Incorrect API key provided");
        }

        #[test]
        fn test_plain_body_is_truncated() {
            let body = "x".repeat(20);
            assert_eq!(extract_error_message(&body, 5), "xxxxx…");
            assert_eq!(extract_error_message("   ", 5), "no response body");
        }
    }
}
