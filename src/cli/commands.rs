// Subcommand handlers

use anyhow::{Context, Result};
use std::sync::Arc;

use super::console::Console;
use super::menu::run_menu;
use crate::config::Config;
use crate::document::{CommandValidator, Document, Workbench};
use crate::generators::ProviderGenerator;
use crate::ideas::{Bucket, IdeaBacklog};
use crate::providers::create_provider;
use crate::store::ContentStore;

/// Options for a one-off `generate`
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub auto: bool,
}

/// Build the workbench that talks to the configured backend and validator
pub fn build_workbench(config: &Config, console: Arc<dyn Console>) -> Result<Workbench> {
    config.validate_provider()?;
    let provider = create_provider(&config.provider)?;
    tracing::info!(
        "Using {} backend with model {}",
        provider.name(),
        config.provider.model
    );

    let generator = Arc::new(ProviderGenerator::new(
        provider,
        &config.provider,
        config.features.streaming_enabled,
    ));
    let validator = Arc::new(CommandValidator::from_config(&config.validation));
    Ok(Workbench::from_config(config, generator, validator, console))
}

pub async fn menu(bench: &Workbench, config: &Config) -> Result<()> {
    let backlog = IdeaBacklog::open(&config.storage.ideas_dir)?;
    run_menu(bench, &backlog).await
}

/// Generate one document; returns whether its validation passed
pub async fn generate(bench: &Workbench, options: GenerateOptions) -> Result<bool> {
    let mut document = Document::new(
        options.title,
        options.description,
        options.source_url,
        options.auto,
    );
    document.generate(bench).await?;

    let errors = document.get_errors();
    if !errors.is_empty() {
        bench.console.info(&format!(
            "{} validation failure(s) were recorded for '{}'.",
            errors.len(),
            document.title()
        ));
    }
    Ok(document.all_tests_passed())
}

pub fn show(store: &ContentStore, console: &dyn Console, title: &str) -> Result<()> {
    let document = Document::load(store, title)?
        .with_context(|| format!("No saved document titled '{}'", title))?;
    document.display(console);

    if let Some(section) = document.sections.iter().find(|s| s.requires_validation()) {
        let status = if section.passed { "passed" } else { "not passed" };
        console.info(&format!("{} validation: {}", section.kind, status));
    }
    Ok(())
}

pub fn delete(store: &ContentStore, console: &dyn Console, title: &str) -> Result<()> {
    if Document::delete(store, title)? {
        console.success(&format!("Deleted '{}'.", title));
    } else {
        console.warning(&format!("No saved document titled '{}'.", title));
    }
    Ok(())
}

pub fn list_documents(store: &ContentStore, console: &dyn Console) -> Result<()> {
    let titles = store.list_documents()?;
    if titles.is_empty() {
        console.say("No documents have been generated yet.");
    }
    for title in titles {
        console.say(&title);
    }
    Ok(())
}

pub fn add_idea(config: &Config, console: &dyn Console, title: &str, description: &str) -> Result<()> {
    let backlog = IdeaBacklog::open(&config.storage.ideas_dir)?;
    backlog.add_candidate(title, description)?;
    console.success(&format!("Added '{}' to the candidates.", title));
    Ok(())
}

pub fn list_ideas(config: &Config, console: &dyn Console) -> Result<()> {
    let backlog = IdeaBacklog::open(&config.storage.ideas_dir)?;
    for bucket in Bucket::ALL {
        let entries = backlog.entries(bucket)?;
        console.title(&format!("{} ({})", bucket, entries.len()), 2);
        for (i, entry) in entries.iter().enumerate() {
            let mut line = format!("{}. {}\n\t{}", i + 1, entry.title, entry.description);
            if let Some(filename) = &entry.filename {
                line.push_str(&format!("\n\t{}", filename));
            }
            console.say(&line);
        }
    }
    Ok(())
}
