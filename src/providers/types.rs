// Unified request/response types for chat-completion backends

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role tag of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// One role-tagged message. A request is an ordered list of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Provider-agnostic request
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,

    /// Model name; empty means "provider default"
    pub model: String,

    pub max_tokens: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip)]
    pub stream: bool,
}

impl ProviderRequest {
    /// Create a new request from messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            model: String::new(), // Will be set by provider
            max_tokens: 4096,
            temperature: None,
            top_p: None,
            stream: false,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// Unified response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderResponse {
    pub id: String,
    pub model: String,

    /// Generated text. `None` when the backend answered with a non-text payload.
    pub text: Option<String>,

    pub stop_reason: Option<String>,

    /// Provider name (e.g. "openai", "azure")
    pub provider: String,
}

/// Streaming chunk
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Incremental text, to be appended in arrival order
    TextDelta(String),
    /// The backend signalled the end of the response
    Finished { stop_reason: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_request_defaults() {
        let req = ProviderRequest::new(vec![Message::user("Hello")]);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.model, "");
        assert_eq!(req.max_tokens, 4096);
        assert!(req.temperature.is_none());
        assert!(!req.stream);
    }

    #[test]
    fn test_provider_request_builder_chain() {
        let req = ProviderRequest::new(vec![Message::system("s"), Message::user("u")])
            .with_model("gpt-4o")
            .with_max_tokens(1024)
            .with_temperature(0.7)
            .with_top_p(1.0)
            .with_stream(true);

        assert_eq!(req.model, "gpt-4o");
        assert_eq!(req.max_tokens, 1024);
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.top_p, Some(1.0));
        assert!(req.stream);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::system("be brief")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);
        assert_eq!(Role::User.to_string(), "user");
    }
}
