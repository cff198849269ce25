//! Error types for LLM providers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    StatusError { status: u16, body: String },

    #[error("Request failed: malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_embeds_code() {
        let error = LlmError::StatusError {
            status: 500,
            body: "internal".to_string(),
        };
        assert!(error.to_string().contains("500"));
    }

    #[test]
    fn test_malformed_reads_as_request_failure() {
        let error = LlmError::MalformedResponse("no choices".to_string());
        assert!(error.to_string().starts_with("Request failed"));
    }
}
