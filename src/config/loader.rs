// Configuration loader
// Loads settings from ~/.docwright/config.toml (or an explicit path), then
// applies environment overrides

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::{Config, ProviderKind};

/// Load configuration from an explicit path, or the default location when `None`.
///
/// A missing file is not an error: defaults plus environment variables are
/// enough to run the commands that don't talk to the backend.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    let mut config = match path {
        Some(ref path) if path.exists() => load_config_from(path)?,
        Some(ref path) if explicit.is_some() => {
            anyhow::bail!("Configuration file not found: {}", path.display())
        }
        _ => Config::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Parse a TOML configuration file without applying environment overrides
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".docwright").join("config.toml"))
}

/// Apply environment variable overrides.
///
/// Azure variables switch the provider kind to Azure. `lookup` is injected so
/// tests don't have to mutate the process environment.
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(endpoint) = non_empty("AZURE_OPENAI_ENDPOINT") {
        config.provider.kind = ProviderKind::Azure;
        config.provider.base_url = Some(endpoint);
    }
    if let Some(key) = non_empty("AZURE_OPENAI_API_KEY") {
        config.provider.kind = ProviderKind::Azure;
        config.provider.api_key = Some(key);
    }
    if let Some(deployment) = non_empty("AZURE_OPENAI_DEPLOYMENT") {
        config.provider.deployment = Some(deployment);
    }
    if let Some(model) = non_empty("AZURE_OPENAI_MODEL_NAME") {
        config.provider.model = model;
    }

    if config.provider.api_key.is_none() {
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            config.provider.api_key = Some(key);
        }
    }

    if let Some(runs) = non_empty("DOCWRIGHT_MAX_TEST_RUNS") {
        match runs.trim().parse::<usize>() {
            Ok(n) => config.validation.max_attempts = n,
            Err(_) => tracing::warn!("Ignoring DOCWRIGHT_MAX_TEST_RUNS={:?}: not a number", runs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[provider]
kind = "azure"
api_key = "abc"
base_url = "https://res.openai.azure.com"
deployment = "gpt-4o"

[validation]
command = "ie"
args = ["test", "--verbose"]
max_attempts = 3

[editor]
enabled = false

[features]
streaming_enabled = false
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::Azure);
        assert_eq!(config.provider.deployment.as_deref(), Some("gpt-4o"));
        assert_eq!(config.validation.max_attempts, 3);
        assert_eq!(config.validation.args.len(), 2);
        assert!(!config.editor.enabled);
        assert!(!config.features.streaming_enabled);
        // Untouched sections keep their defaults
        assert_eq!(config.storage.prompt_dir, PathBuf::from("system_prompts"));
        assert_eq!(config.provider.max_tokens, 4096);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[provider\nkind = ").unwrap();
        assert!(load_config_from(&path).is_err());
    }

    #[test]
    fn test_azure_env_switches_kind() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
                ("AZURE_OPENAI_API_KEY", "azure-key"),
                ("AZURE_OPENAI_DEPLOYMENT", "dep"),
            ]),
        );
        assert_eq!(config.provider.kind, ProviderKind::Azure);
        assert_eq!(config.provider.api_key.as_deref(), Some("azure-key"));
        assert_eq!(config.provider.deployment.as_deref(), Some("dep"));
    }

    #[test]
    fn test_openai_key_does_not_override_file_key() {
        let mut config = Config::default();
        config.provider.api_key = Some("from-file".into());
        apply_env_overrides(&mut config, env(&[("OPENAI_API_KEY", "from-env")]));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_max_test_runs_override() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, env(&[("DOCWRIGHT_MAX_TEST_RUNS", "3")]));
        assert_eq!(config.validation.max_attempts, 3);

        apply_env_overrides(&mut config, env(&[("DOCWRIGHT_MAX_TEST_RUNS", "many")]));
        assert_eq!(config.validation.max_attempts, 3);
    }
}
