//! OpenAI-compatible chat-completion provider

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{
    errors::{LlmError, LlmResult},
    provider::{utils, LlmProvider, ProviderClientOptions},
    types::{ChatRequest, Message, ProviderConfig, ProviderResponse},
};

/// Provider for any endpoint speaking the OpenAI chat-completions protocol
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
    options: ProviderClientOptions,
}

impl OpenAIProvider {
    /// Create a new provider. The bearer header is built here so a malformed
    /// credential is reported before any request is attempted.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let mut headers = HeaderMap::new();

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|e| LlmError::ConfigError(format!("Invalid API key: {}", e)))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let options = ProviderClientOptions::default();
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(&options.user_agent)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            options,
        })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn chat_completion(&self, request: ChatRequest) -> LlmResult<ProviderResponse> {
        let body = OpenAIRequest {
            model: self.config.model.as_str(),
            messages: &request.messages,
        };

        debug!(
            "POST {} (model {}, {} messages)",
            self.endpoint(),
            self.config.model,
            request.messages.len()
        );

        let response = self.client.post(self.endpoint()).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!("Chat completion returned status {}", status.as_u16());
            return Err(LlmError::StatusError {
                status: status.as_u16(),
                body: utils::extract_error_message(&text, self.options.max_error_body),
            });
        }

        let parsed: OpenAIResponse = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

        let content = choice.message.content.ok_or_else(|| {
            LlmError::MalformedResponse("first choice has no message content".to_string())
        })?;

        Ok(ProviderResponse { content })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        self.config.model.as_str()
    }

    fn validate_config(&self) -> LlmResult<()> {
        let endpoint = self.config.endpoint.trim();
        if endpoint.is_empty() {
            return Err(LlmError::ConfigError("Endpoint is required".to_string()));
        }

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(LlmError::ConfigError(format!(
                "Endpoint must be an http(s) URL: {}",
                endpoint
            )));
        }

        Ok(())
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelId;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(endpoint: String) -> ProviderConfig {
        ProviderConfig {
            endpoint,
            api_key: "sk-test".to_string(),
            model: ModelId::Gpt4oMini,
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![Message::system("format as markdown"), Message::user("hello")],
        }
    }

    #[tokio::test]
    async fn test_sends_bearer_and_expected_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "format as markdown"},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi **there**"}}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            OpenAIProvider::new(config_for(format!("{}/v1/chat/completions", mock_server.uri())))
                .unwrap();

        let response = provider.chat_completion(request()).await.unwrap();
        assert_eq!(response.content, "hi **there**");
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string(r#"{"error": {"message": "upstream exploded"}}"#),
            )
            .mount(&mock_server)
            .await;

        let provider = OpenAIProvider::new(config_for(mock_server.uri())).unwrap();
        let error = provider.chat_completion(request()).await.unwrap_err();

        assert!(matches!(error, LlmError::StatusError { status: 500, .. }));
        let message = error.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_missing_choices_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
            .mount(&mock_server)
            .await;

        let provider = OpenAIProvider::new(config_for(mock_server.uri())).unwrap();
        let error = provider.chat_completion(request()).await.unwrap_err();
        assert!(matches!(error, LlmError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_and_null_content_are_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/null"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": null}}]
            })))
            .mount(&mock_server)
            .await;

        let empty = OpenAIProvider::new(config_for(format!("{}/empty", mock_server.uri()))).unwrap();
        assert!(matches!(
            empty.chat_completion(request()).await,
            Err(LlmError::MalformedResponse(_))
        ));

        let null = OpenAIProvider::new(config_for(format!("{}/null", mock_server.uri()))).unwrap();
        assert!(matches!(
            null.chat_completion(request()).await,
            Err(LlmError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_failure_is_http_error() {
        let provider = OpenAIProvider::new(config_for("http://127.0.0.1:1/v1".to_string())).unwrap();
        let error = provider.chat_completion(request()).await.unwrap_err();
        assert!(matches!(error, LlmError::HttpError(_)));
        assert!(error.to_string().starts_with("Request failed"));
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let mut config = config_for("https://example.com".to_string());
        config.api_key = "line\nbreak".to_string();
        assert!(matches!(OpenAIProvider::new(config), Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let provider = OpenAIProvider::new(config_for("ftp://example.com".to_string())).unwrap();
        assert!(provider.validate_config().is_err());

        let provider = OpenAIProvider::new(config_for("  ".to_string())).unwrap();
        assert!(provider.validate_config().is_err());

        let provider = OpenAIProvider::new(config_for("https://example.com/v1".to_string())).unwrap();
        assert!(provider.validate_config().is_ok());
    }
}
