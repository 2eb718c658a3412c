// OpenAI API provider implementation
//
// Serves both api.openai.com (and compatible endpoints) and Azure OpenAI
// deployments, which share the chat-completions wire format and differ only
// in URL layout and auth header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use super::types::{Message, ProviderRequest, ProviderResponse, StreamChunk};
use super::LlmProvider;

const REQUEST_TIMEOUT_SECS: u64 = 300;

/// How the API key is presented
#[derive(Debug, Clone)]
enum Auth {
    /// `Authorization: Bearer <key>` (OpenAI)
    Bearer(String),
    /// `api-key: <key>` (Azure)
    ApiKey(String),
}

/// OpenAI-format chat-completions provider
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    auth: Auth,
    completions_url: String,
    default_model: String,
    provider_name: String,
}

impl OpenAIProvider {
    /// Create a provider for api.openai.com
    pub fn new_openai(api_key: String) -> Result<Self> {
        Self::new_openai_compatible(api_key, "https://api.openai.com".to_string())
    }

    /// Create a provider for any OpenAI-compatible base URL
    pub fn new_openai_compatible(api_key: String, base_url: String) -> Result<Self> {
        let completions_url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        Self::new(
            Auth::Bearer(api_key),
            completions_url,
            "gpt-4o".to_string(),
            "openai".to_string(),
        )
    }

    /// Create a provider for an Azure OpenAI deployment
    pub fn new_azure(
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    ) -> Result<Self> {
        let completions_url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );
        Self::new(Auth::ApiKey(api_key), completions_url, deployment, "azure".to_string())
    }

    /// Set custom model for this provider
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn new(
        auth: Auth,
        completions_url: String,
        default_model: String,
        provider_name: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            auth,
            completions_url,
            default_model,
            provider_name,
        })
    }

    /// URL requests are posted to (exposed for diagnostics)
    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    /// Convert ProviderRequest to OpenAI API format
    fn to_openai_request(&self, request: &ProviderRequest) -> OpenAIRequest {
        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        OpenAIRequest {
            model,
            messages: request.messages.clone(),
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            top_p: request.top_p,
            stream: request.stream,
        }
    }

    /// Convert OpenAI response to ProviderResponse
    fn from_openai_response(&self, response: OpenAIResponse) -> Result<ProviderResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("OpenAI returned no choices in response")?;

        let text = choice.message.content.filter(|t| !t.is_empty());

        Ok(ProviderResponse {
            id: response.id,
            model: response.model,
            text,
            stop_reason: choice.finish_reason,
            provider: self.provider_name.clone(),
        })
    }

    fn post(&self, body: &OpenAIRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(&self.completions_url)
            .header("content-type", "application/json")
            .json(body);
        match &self.auth {
            Auth::Bearer(key) => builder.header("Authorization", format!("Bearer {}", key)),
            Auth::ApiKey(key) => builder.header("api-key", key),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let mut openai_request = self.to_openai_request(request);
        openai_request.stream = false;

        tracing::debug!(
            "Sending request to {} ({} messages)",
            self.provider_name,
            openai_request.messages.len()
        );

        let response = self
            .post(&openai_request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {} API", self.provider_name))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "{} API request failed\n\nStatus: {}\nBody: {}",
                self.provider_name,
                status,
                error_body
            );
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} API response", self.provider_name))?;

        tracing::debug!("Received response {}", openai_response.id);

        self.from_openai_response(openai_response)
    }

    async fn send_message_stream(
        &self,
        request: &ProviderRequest,
    ) -> Result<mpsc::Receiver<Result<StreamChunk>>> {
        let (tx, rx) = mpsc::channel(100);

        let mut openai_request = self.to_openai_request(request);
        openai_request.stream = true;

        tracing::debug!("Sending streaming request to {}", self.provider_name);

        let response = self
            .post(&openai_request)
            .send()
            .await
            .with_context(|| {
                format!("Failed to send streaming request to {} API", self.provider_name)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "{} API streaming request failed\n\nStatus: {}\nBody: {}",
                self.provider_name,
                status,
                error_body
            );
        }

        // Spawn task to parse SSE stream
        tokio::spawn(async move {
            tracing::debug!("[STREAM] streaming task started");
            let mut stream = response.bytes_stream();
            let mut buffer = Vec::new();
            let mut stop_reason: Option<String> = None;
            let mut done = false;

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.extend_from_slice(&bytes);

                        // Parse line by line
                        while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                            let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
                            let line = String::from_utf8_lossy(&line_bytes);

                            // SSE format: "data: {...}\n"
                            let Some(json_str) = line.strip_prefix("data:") else {
                                continue;
                            };
                            let json_str = json_str.trim();

                            if json_str == "[DONE]" {
                                tracing::debug!("[STREAM] Received [DONE]");
                                done = true;
                                break;
                            }

                            let Ok(stream_chunk) =
                                serde_json::from_str::<OpenAIStreamChunk>(json_str)
                            else {
                                tracing::debug!("[STREAM] Skipping unparsable line");
                                continue;
                            };

                            // Azure sends a leading chunk with no choices (filter results)
                            let Some(choice) = stream_chunk.choices.into_iter().next() else {
                                continue;
                            };

                            if let Some(reason) = choice.finish_reason {
                                stop_reason = Some(reason);
                            }

                            if let Some(content) = choice.delta.content {
                                if content.is_empty() {
                                    continue;
                                }
                                if tx.send(Ok(StreamChunk::TextDelta(content))).await.is_err() {
                                    // Receiver dropped
                                    return;
                                }
                            }
                        }

                        if done {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Stream error: {}", e);
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                }
            }

            let _ = tx.send(Ok(StreamChunk::Finished { stop_reason })).await;
            tracing::debug!("[STREAM] streaming task finished");
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "is_false")]
    stream: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    id: String,
    model: String,
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Streaming types

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChunk {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}
