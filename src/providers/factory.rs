// Provider factory
//
// Creates the chat-completion provider described by the configuration

use anyhow::{Context, Result};
use std::sync::Arc;

use super::openai::OpenAIProvider;
use super::LlmProvider;
use crate::config::{ProviderConfig, ProviderKind};

/// Create the `LlmProvider` for a provider configuration.
///
/// Call `Config::validate_provider` first; this only reports the first
/// missing field it trips over.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn LlmProvider>> {
    let api_key = config
        .api_key
        .clone()
        .context("provider.api_key is not set")?;

    let provider = match config.kind {
        ProviderKind::Openai => {
            let provider = match &config.base_url {
                Some(base_url) => OpenAIProvider::new_openai_compatible(api_key, base_url.clone())?,
                None => OpenAIProvider::new_openai(api_key)?,
            };
            provider.with_model(config.model.clone())
        }
        ProviderKind::Azure => {
            let endpoint = config
                .base_url
                .clone()
                .context("provider.base_url (Azure endpoint) is not set")?;
            let deployment = config
                .deployment
                .clone()
                .context("provider.deployment is not set")?;
            OpenAIProvider::new_azure(endpoint, api_key, deployment, config.api_version.clone())?
        }
    };

    tracing::debug!("Created {} provider", provider.name());
    Ok(Arc::new(provider))
}
