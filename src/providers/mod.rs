// Chat-completion backend support
//
// This module provides an abstraction layer over the chat-completion
// services a document can be generated with (OpenAI and Azure OpenAI today),
// so the generation layer only ever sees `LlmProvider`.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

pub mod types;

// Provider implementations
pub mod openai;

// Provider factory
pub mod factory;

// Re-export commonly used types
pub use factory::create_provider;
pub use types::{Message, ProviderRequest, ProviderResponse, Role, StreamChunk};

/// Trait for chat-completion backends
///
/// Every backend implements this trait, providing a unified interface for
/// sending a list of role-tagged messages and receiving generated text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the complete response
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Send a request and stream the response
    ///
    /// Returns a channel of `StreamChunk`s. Text deltas arrive in generation
    /// order; the channel closes when the response is complete.
    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<Receiver<Result<StreamChunk>>>;

    /// Provider name (e.g. "openai", "azure")
    fn name(&self) -> &str;

    /// Default model (or deployment) for this provider
    fn default_model(&self) -> &str;

    /// Check if the provider supports streaming
    fn supports_streaming(&self) -> bool {
        true
    }
}
