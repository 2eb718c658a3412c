// Section kinds, section state and the section controller

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::edit::edit_section;
use super::validation::RepairCycle;
use super::Workbench;
use crate::cli::Console;
use crate::errors::DocError;
use crate::generators::Generation;
use crate::prompts::{self, DocumentView};
use crate::providers::Message;
use crate::store::Artifact;

type PromptFn = fn(&DocumentView<'_>, &dyn Console) -> Result<String>;

/// The fixed set of section kinds, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Overview,
    Deployment,
    Summary,
}

/// Static per-kind behaviour
pub struct SectionSpec {
    pub kind: SectionKind,
    pub prompt: PromptFn,
    pub requires_validation: bool,
}

static REGISTRY: [SectionSpec; 3] = [
    SectionSpec {
        kind: SectionKind::Overview,
        prompt: prompts::overview_prompt,
        requires_validation: false,
    },
    SectionSpec {
        kind: SectionKind::Deployment,
        prompt: prompts::deployment_prompt,
        requires_validation: true,
    },
    SectionSpec {
        kind: SectionKind::Summary,
        prompt: prompts::summary_prompt,
        requires_validation: false,
    },
];

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Overview,
        SectionKind::Deployment,
        SectionKind::Summary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Overview => "Overview",
            SectionKind::Deployment => "Deployment",
            SectionKind::Summary => "Summary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    pub fn spec(&self) -> &'static SectionSpec {
        match self {
            SectionKind::Overview => &REGISTRY[0],
            SectionKind::Deployment => &REGISTRY[1],
            SectionKind::Summary => &REGISTRY[2],
        }
    }

    pub fn requires_validation(&self) -> bool {
        self.spec().requires_validation
    }

    /// User prompt for a fresh generation of this kind
    pub fn build_prompt(&self, doc: &DocumentView<'_>, console: &dyn Console) -> Result<String> {
        (self.spec().prompt)(doc, console)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a section is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionState {
    Empty,
    Generating,
    Generated,
    Editing,
    Validating,
    Repairing,
    Passed,
    Abandoned,
}

/// One failed validation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "error_message")]
    pub message: String,
}

impl ErrorEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// `Section::meta_data` key: when the backend last produced fresh content
pub const GENERATED_AT_KEY: &str = "generated_at";
/// `Section::meta_data` key: when the last validation cycle finished
pub const VALIDATED_AT_KEY: &str = "validated_at";
/// `Section::meta_data` key: validator runs in the last cycle
pub const VALIDATION_ATTEMPTS_KEY: &str = "validation_attempts";

/// One part of a document, owned by exactly one `Document`
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    pub content: Option<String>,
    /// Bookkeeping persisted with the snapshot (see the `*_KEY` constants)
    pub meta_data: BTreeMap<String, String>,
    /// Only meaningful for kinds that require validation
    pub passed: bool,
    pub error_log: Vec<ErrorEntry>,
    state: SectionState,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            content: None,
            meta_data: BTreeMap::new(),
            passed: false,
            error_log: Vec::new(),
            state: SectionState::Empty,
        }
    }

    pub fn title(&self) -> &'static str {
        self.kind.name()
    }

    pub fn requires_validation(&self) -> bool {
        self.kind.requires_validation()
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, next: SectionState) {
        if self.state != next {
            tracing::debug!("{}: {:?} -> {:?}", self.kind, self.state, next);
            self.state = next;
        }
    }

    /// Restore a section from persisted data
    pub(crate) fn restored(
        kind: SectionKind,
        content: Option<String>,
        meta_data: BTreeMap<String, String>,
        passed: bool,
        error_log: Vec<ErrorEntry>,
    ) -> Self {
        let state = match (&content, kind.requires_validation(), passed) {
            (None, _, _) => SectionState::Empty,
            (Some(_), true, true) => SectionState::Passed,
            (Some(_), true, false) if !error_log.is_empty() => SectionState::Abandoned,
            (Some(_), _, _) => SectionState::Generated,
        };
        Self {
            kind,
            content,
            meta_data,
            passed,
            error_log,
            state,
        }
    }

    /// Run this section's lifecycle.
    ///
    /// Stored content for `(doc.title, kind)` is reused without building a
    /// prompt or calling the backend. `doc.sections` holds the sections that
    /// precede this one.
    pub async fn generate(&mut self, bench: &Workbench, doc: &DocumentView<'_>) -> Result<()> {
        let artifact = Artifact::Section(self.kind);
        self.set_state(SectionState::Generating);

        match bench.store.load(doc.title, artifact)? {
            Some(stored) if !stored.is_empty() => {
                tracing::info!("Reusing stored {} for '{}'", self.kind, doc.title);
                bench
                    .console
                    .info(&format!("Using the existing {} section.", self.kind));
                self.content = Some(stored);
            }
            _ => {
                let prompt = self.kind.build_prompt(doc, bench.console.as_ref())?;
                let messages = vec![
                    bench.prompts.system_message(artifact)?,
                    Message::user(prompts::generation_request(self.kind.name(), &prompt)),
                ];

                bench
                    .console
                    .info(&format!("Generating the {} section...", self.kind));
                match bench.generator.generate(messages).await? {
                    Generation::Content(text) => {
                        bench.store.save(doc.title, artifact, &text)?;
                        self.content = Some(text);
                        self.meta_data
                            .insert(GENERATED_AT_KEY.to_string(), Utc::now().to_rfc3339());
                    }
                    Generation::Apology => {
                        self.set_state(SectionState::Empty);
                        bench.console.error(&format!(
                            "No content was generated for the {} section.",
                            self.kind
                        ));
                        return Err(DocError::NoContent {
                            title: doc.title.to_string(),
                            section: self.kind.name().to_string(),
                        }
                        .into());
                    }
                }
            }
        }
        self.set_state(SectionState::Generated);

        if !doc.auto {
            loop {
                self.set_state(SectionState::Editing);
                let changed = edit_section(bench, doc.title, self.kind, doc.auto, None).await?;
                self.set_state(SectionState::Generated);
                if !changed {
                    break;
                }
            }
        }

        if self.requires_validation() {
            RepairCycle::new(bench).run(self, doc.title, doc.auto).await?;
        }

        self.content = bench.store.load(doc.title, artifact)?;
        Ok(())
    }

    pub fn display(&self, console: &dyn Console) {
        console.title(self.title(), 2);
        match &self.content {
            Some(content) => console.say(content),
            None => console.info("(not generated)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_flags() {
        let names: Vec<_> = SectionKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["Overview", "Deployment", "Summary"]);
        for kind in SectionKind::ALL {
            assert_eq!(kind.spec().kind, kind);
        }
        assert!(SectionKind::Deployment.requires_validation());
        assert!(!SectionKind::Overview.requires_validation());
        assert!(!SectionKind::Summary.requires_validation());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(SectionKind::from_name("deployment"), Some(SectionKind::Deployment));
        assert_eq!(SectionKind::from_name("meta_data"), None);
    }

    #[test]
    fn test_error_entry_field_names() {
        let entry = ErrorEntry::now("boom");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["error_message"], "boom");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_restored_state() {
        let passed = Section::restored(
            SectionKind::Deployment,
            Some("x".into()),
            BTreeMap::new(),
            true,
            vec![],
        );
        assert_eq!(passed.state(), SectionState::Passed);

        let abandoned = Section::restored(
            SectionKind::Deployment,
            Some("x".into()),
            BTreeMap::new(),
            false,
            vec![ErrorEntry::now("e")],
        );
        assert_eq!(abandoned.state(), SectionState::Abandoned);

        let empty = Section::restored(SectionKind::Summary, None, BTreeMap::new(), false, vec![]);
        assert_eq!(empty.state(), SectionState::Empty);
    }
}
