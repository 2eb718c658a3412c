// Generator backed by an `LlmProvider`

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::{collect_stream, validate_messages, Generation, Generator};
use crate::config::ProviderConfig;
use crate::providers::{LlmProvider, Message, ProviderRequest};

/// Sends requests to a chat-completion provider and absorbs backend
/// failures into `Generation::Apology`.
pub struct ProviderGenerator {
    provider: Arc<dyn LlmProvider>,
    streaming: bool,
    max_tokens: u32,
    temperature: f32,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &ProviderConfig, streaming: bool) -> Self {
        Self {
            provider,
            streaming,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    fn request(&self, messages: Vec<Message>) -> ProviderRequest {
        ProviderRequest::new(messages)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_top_p(1.0)
            .with_stream(self.streaming)
    }

    async fn send(&self, request: &ProviderRequest) -> Result<Option<String>> {
        if request.stream && self.provider.supports_streaming() {
            let rx = self.provider.send_message_stream(request).await?;
            collect_stream(rx).await
        } else {
            let response = self.provider.send_message(request).await?;
            Ok(response.text)
        }
    }
}

#[async_trait]
impl Generator for ProviderGenerator {
    async fn generate(&self, messages: Vec<Message>) -> Result<Generation> {
        validate_messages(&messages)?;

        let prompt_preview: String = messages
            .last()
            .map(|m| m.content.chars().take(80).collect())
            .unwrap_or_default();
        let request = self.request(messages);

        match self.send(&request).await {
            Ok(Some(text)) => Ok(Generation::Content(text)),
            Ok(None) => {
                tracing::warn!(
                    "{} returned no text for prompt {:?}",
                    self.provider.name(),
                    prompt_preview
                );
                Ok(Generation::Apology)
            }
            Err(e) => {
                tracing::warn!(
                    "{} rejected request ({}) for prompt {:?}",
                    self.provider.name(),
                    e,
                    prompt_preview
                );
                Ok(Generation::Apology)
            }
        }
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
