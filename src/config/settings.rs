// Configuration structs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::constants::{
    DEFAULT_AZURE_API_VERSION, DEFAULT_MAX_TEST_RUNS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::errors;

/// Which flavour of chat-completion API to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// api.openai.com or any OpenAI-compatible endpoint
    Openai,
    /// Azure OpenAI deployment
    Azure,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// API key (OpenAI bearer token or Azure `api-key`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL; for Azure this is the resource endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name (OpenAI) - informational for Azure
    pub model: String,

    /// Azure deployment name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    /// Azure API version
    pub api_version: String,

    pub max_tokens: u32,

    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Openai,
            api_key: None,
            base_url: None,
            model: "gpt-4o".to_string(),
            deployment: None,
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Where documents, prompts and the idea backlog live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of all persisted state (documents go under `<data_dir>/Document`)
    pub data_dir: PathBuf,
    /// Folder holding `<Section>_system_prompt.txt` overrides
    pub prompt_dir: PathBuf,
    /// Folder holding the idea backlog JSON files
    pub ideas_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            prompt_dir: PathBuf::from("system_prompts"),
            ideas_dir: PathBuf::from("data/ideas"),
        }
    }
}

/// External validator invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Executable to run (looked up on PATH)
    pub command: String,
    /// Arguments placed before the document path
    pub args: Vec<String>,
    /// Attempt budget for the validate/repair cycle
    pub max_attempts: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            command: "ie".to_string(),
            args: vec!["test".to_string()],
            max_attempts: DEFAULT_MAX_TEST_RUNS,
        }
    }
}

/// External editor used to show generated files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub command: String,
    pub enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: "code".to_string(),
            enabled: true,
        }
    }
}

/// Feature flags configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Consume backend responses as incremental fragments
    #[serde(default = "default_true")]
    pub streaming_enabled: bool,

    /// Enable debug logging for troubleshooting
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            streaming_enabled: true,
            debug_logging: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub storage: StorageConfig,
    pub validation: ValidationConfig,
    pub editor: EditorConfig,
    pub features: FeaturesConfig,
}

impl Config {
    /// Validate the parts of the configuration every command relies on
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.validation.max_attempts == 0 {
            anyhow::bail!("validation.max_attempts must be greater than 0");
        }

        if self.validation.command.trim().is_empty() {
            anyhow::bail!("validation.command must name an executable");
        }

        if !(0.0..=2.0).contains(&self.provider.temperature) {
            anyhow::bail!(
                "provider.temperature ({}) must be between 0.0 and 2.0",
                self.provider.temperature
            );
        }

        Ok(())
    }

    /// Validate the backend settings. Only commands that generate call this.
    pub fn validate_provider(&self) -> anyhow::Result<()> {
        let key_missing = self
            .provider
            .api_key
            .as_deref()
            .map(|k| k.trim().is_empty())
            .unwrap_or(true);
        if key_missing {
            anyhow::bail!(errors::missing_api_key_error());
        }

        if self.provider.kind == ProviderKind::Azure {
            if self.provider.base_url.is_none() {
                anyhow::bail!(
                    "Azure provider needs an endpoint. Set provider.base_url or AZURE_OPENAI_ENDPOINT."
                );
            }
            if self.provider.deployment.is_none() {
                anyhow::bail!(
                    "Azure provider needs a deployment. Set provider.deployment or AZURE_OPENAI_DEPLOYMENT."
                );
            }
        }

        Ok(())
    }
}
