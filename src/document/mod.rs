// Document controller
//
// A document owns its sections in a fixed order and generates them one after
// another: each section's prompt embeds the content of the ones before it.

pub mod edit;
pub mod section;
pub mod snapshot;
pub mod validation;

pub use section::{
    ErrorEntry, Section, SectionKind, SectionState, GENERATED_AT_KEY, VALIDATED_AT_KEY,
    VALIDATION_ATTEMPTS_KEY,
};
pub use snapshot::{DocumentSnapshot, SectionSnapshot};
pub use validation::{CommandValidator, RepairCycle, ValidationOutcome, Validator};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cli::Console;
use crate::config::Config;
use crate::errors::DocError;
use crate::generators::Generator;
use crate::prompts::{DocumentView, PromptLibrary};
use crate::sources;
use crate::store::{read_optional, write_atomic, Artifact, ContentStore};

/// Collaborators shared by every controller in a generation run
pub struct Workbench {
    pub generator: Arc<dyn Generator>,
    pub validator: Arc<dyn Validator>,
    pub console: Arc<dyn Console>,
    pub store: ContentStore,
    pub prompts: PromptLibrary,
    pub http: reqwest::Client,
    /// Validation attempt budget per repair cycle
    pub max_attempts: usize,
}

impl Workbench {
    pub fn from_config(
        config: &Config,
        generator: Arc<dyn Generator>,
        validator: Arc<dyn Validator>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            generator,
            validator,
            console,
            store: ContentStore::new(&config.storage.data_dir),
            prompts: PromptLibrary::new(&config.storage.prompt_dir),
            http: reqwest::Client::new(),
            max_attempts: config.validation.max_attempts,
        }
    }
}

/// Contents of `<t>_meta_data.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Any other keys, kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            source_url: None,
            extra: BTreeMap::new(),
        }
    }

    /// Parse edited metadata. It must be a JSON object with a non-empty `name`.
    pub fn parse(raw: &str) -> std::result::Result<Self, DocError> {
        let malformed = |reason: String| DocError::MalformedMetadata { reason };

        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        let name = value
            .as_object()
            .ok_or_else(|| malformed("expected a JSON object".to_string()))?
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::trim)
            .unwrap_or_default();
        if name.is_empty() {
            return Err(malformed("missing \"name\"".to_string()));
        }

        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    /// Suppresses every interactive prompt
    pub auto: bool,
    pub meta_data: DocumentMeta,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn new(
        title: Option<String>,
        description: Option<String>,
        source_url: Option<String>,
        auto: bool,
    ) -> Self {
        let mut meta_data = DocumentMeta::named(title.clone().unwrap_or_default());
        meta_data.description = description.clone();
        meta_data.source_url = source_url.clone();

        Self {
            title,
            description,
            source_url,
            auto,
            meta_data,
            sections: SectionKind::ALL.into_iter().map(Section::new).collect(),
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Generate every section in order, then persist the composite document.
    pub async fn generate(&mut self, bench: &Workbench) -> Result<()> {
        let stated_description = self.description.clone();

        if self.auto {
            if let Some(url) = self.source_url.clone() {
                bench
                    .console
                    .info(&format!("Fetching seed content from {}", url));
                let seed = sources::fetch_seed(&bench.http, &url).await?;
                self.description = Some(sources::fold_into_description(
                    self.description.as_deref(),
                    &seed,
                ));
            }
        }

        let mut title = match self.title.clone().filter(|t| !t.trim().is_empty()) {
            Some(title) => title,
            None if self.auto => return Err(DocError::MissingTitle.into()),
            None => {
                let answer = bench.console.ask("Enter the title of the document:")?;
                let answer = answer.trim().to_string();
                if answer.is_empty() {
                    return Err(DocError::MissingTitle.into());
                }
                answer
            }
        };

        self.title = Some(title.clone());
        bench.console.title(&title, 1);
        let renamed = self
            .prepare_metadata(bench, &mut title, stated_description)
            .await;
        self.title = Some(title.clone());
        renamed?;

        for i in 0..self.sections.len() {
            let (prior, rest) = self.sections.split_at_mut(i);
            let view = DocumentView {
                title: &title,
                description: self.description.as_deref(),
                auto: self.auto,
                sections: prior,
            };
            rest[0].generate(bench, &view).await?;
        }

        self.save(&bench.store)?;

        if self.all_tests_passed() {
            bench.console.success(&format!("'{}' is complete.", title));
        } else {
            bench.console.warning(&format!(
                "'{}' was saved but its deployment did not pass validation.",
                title
            ));
        }

        if !self.auto {
            bench
                .console
                .open_for_editing(&bench.store.markdown_path(&title))?;
        }
        Ok(())
    }

    /// Load or create the metadata artifact; interactively, offer it for
    /// editing (which may rename the document) until nothing changes.
    async fn prepare_metadata(
        &mut self,
        bench: &Workbench,
        title: &mut String,
        description: Option<String>,
    ) -> Result<()> {
        let meta = match bench.store.load(title, Artifact::MetaData)? {
            Some(raw) => DocumentMeta::parse(&raw)?,
            None => {
                let mut meta = DocumentMeta::named(title.clone());
                meta.description = description;
                meta.source_url = self.source_url.clone();
                bench.store.save(title, Artifact::MetaData, &meta.to_json()?)?;
                meta
            }
        };
        self.meta_data = meta;

        if !self.auto {
            while edit::edit_metadata(bench, title, self.auto).await? {}
            let raw = bench
                .store
                .load(title, Artifact::MetaData)?
                .unwrap_or_default();
            self.meta_data = DocumentMeta::parse(&raw)?;
        }
        Ok(())
    }

    /// True iff every section that requires validation passed
    pub fn all_tests_passed(&self) -> bool {
        self.sections
            .iter()
            .filter(|s| s.requires_validation())
            .all(|s| s.passed)
    }

    /// Every validation failure, in section order
    pub fn get_errors(&self) -> Vec<ErrorEntry> {
        self.sections
            .iter()
            .filter(|s| s.requires_validation())
            .flat_map(|s| s.error_log.iter().cloned())
            .collect()
    }

    /// Title heading followed by each section, blank-line separated
    pub fn to_markdown(&self) -> String {
        let mut markdown = format!("# {}\n\n", self.title());
        for section in &self.sections {
            markdown.push_str(section.content.as_deref().unwrap_or_default());
            markdown.push_str("\n\n");
        }
        markdown
    }

    /// Write `<t>.json` and `<t>.md`
    pub fn save(&self, store: &ContentStore) -> Result<()> {
        let title = self.title();
        let snapshot = DocumentSnapshot::capture(self);
        write_atomic(&store.snapshot_path(title), &snapshot.to_json()?)?;
        write_atomic(&store.markdown_path(title), &self.to_markdown())?;
        tracing::info!("Saved document '{}'", title);
        Ok(())
    }

    /// Load a previously saved document; `None` if it was never saved
    pub fn load(store: &ContentStore, title: &str) -> Result<Option<Document>> {
        let path = store.snapshot_path(title);
        match read_optional(&path)? {
            Some(raw) => {
                let snapshot = DocumentSnapshot::from_json(&raw)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                Ok(Some(snapshot.restore()))
            }
            None => Ok(None),
        }
    }

    /// Remove the document's storage location
    pub fn delete(store: &ContentStore, title: &str) -> Result<bool> {
        store.remove_document(title)
    }

    pub fn display(&self, console: &dyn Console) {
        console.title(self.title(), 1);
        for section in &self.sections {
            section.display(console);
        }
    }
}
