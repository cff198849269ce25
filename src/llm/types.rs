//! Common types for LLM providers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message sent to the chat-completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

/// Models offered by the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4.1")]
    Gpt41,
    #[serde(rename = "gpt-4.1-mini")]
    Gpt41Mini,
    #[serde(rename = "gpt-4.1-nano")]
    Gpt41Nano,
    #[serde(rename = "o3-mini")]
    O3Mini,
}

impl ModelId {
    pub const ALL: [ModelId; 6] = [
        ModelId::Gpt4oMini,
        ModelId::Gpt4o,
        ModelId::Gpt41,
        ModelId::Gpt41Mini,
        ModelId::Gpt41Nano,
        ModelId::O3Mini,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt41 => "gpt-4.1",
            ModelId::Gpt41Mini => "gpt-4.1-mini",
            ModelId::Gpt41Nano => "gpt-4.1-nano",
            ModelId::O3Mini => "o3-mini",
        }
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|m| m == self).unwrap_or(0)
    }

    /// Next model in the list, wrapping around
    pub fn next(&self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// Previous model in the list, wrapping around
    pub fn previous(&self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.position() + len - 1) % len]
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown model '{}', expected one of: {}", wanted, names.join(", "))
            })
    }
}

/// Configuration for an LLM provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: ModelId,
}

/// Chat completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
}

/// Response from an LLM provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_cycling_wraps() {
        assert_eq!(ModelId::O3Mini.next(), ModelId::Gpt4oMini);
        assert_eq!(ModelId::Gpt4oMini.previous(), ModelId::O3Mini);
        assert_eq!(ModelId::Gpt4o.next(), ModelId::Gpt41);
    }

    #[test]
    fn test_model_parsing() {
        assert_eq!("gpt-4.1-mini".parse::<ModelId>(), Ok(ModelId::Gpt41Mini));
        assert_eq!(" GPT-4O ".parse::<ModelId>(), Ok(ModelId::Gpt4o));
        assert!("gpt-2".parse::<ModelId>().is_err());
    }

    #[test]
    fn test_model_serde_uses_wire_names() {
        let json = serde_json::to_string(&ModelId::Gpt41Nano).unwrap();
        assert_eq!(json, "\"gpt-4.1-nano\"");
        let model: ModelId = serde_json::from_str("\"o3-mini\"").unwrap();
        assert_eq!(model, ModelId::O3Mini);
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
    }
}
