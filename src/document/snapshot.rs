// Plain-data snapshot of a document
//
// This is what `<t>.json` holds. It is independent of the runtime types so
// the file format only changes when this schema does.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::section::{ErrorEntry, Section, SectionKind, SectionState};
use super::{Document, DocumentMeta};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub auto: bool,
    pub meta_data: DocumentMeta,
    pub sections: Vec<SectionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub kind: SectionKind,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub meta_data: BTreeMap<String, String>,
    #[serde(default)]
    pub requires_validation: bool,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub error_log: Vec<ErrorEntry>,
    /// Informational; the loader derives state from the other fields
    pub state: SectionState,
}

impl From<&Section> for SectionSnapshot {
    fn from(section: &Section) -> Self {
        Self {
            kind: section.kind,
            content: section.content.clone(),
            meta_data: section.meta_data.clone(),
            requires_validation: section.requires_validation(),
            passed: section.passed,
            error_log: section.error_log.clone(),
            state: section.state(),
        }
    }
}

impl From<SectionSnapshot> for Section {
    fn from(snapshot: SectionSnapshot) -> Self {
        Section::restored(
            snapshot.kind,
            snapshot.content,
            snapshot.meta_data,
            snapshot.passed,
            snapshot.error_log,
        )
    }
}

impl DocumentSnapshot {
    pub fn capture(document: &Document) -> Self {
        Self {
            title: document.title().to_string(),
            description: document.description.clone(),
            source_url: document.source_url.clone(),
            auto: document.auto,
            meta_data: document.meta_data.clone(),
            sections: document.sections.iter().map(SectionSnapshot::from).collect(),
        }
    }

    /// Rebuild a document. Sections come back in declared order; kinds the
    /// snapshot lacks are restored empty.
    pub fn restore(self) -> Document {
        let mut by_kind: BTreeMap<&'static str, SectionSnapshot> = self
            .sections
            .into_iter()
            .map(|s| (s.kind.name(), s))
            .collect();

        let sections = SectionKind::ALL
            .into_iter()
            .map(|kind| match by_kind.remove(kind.name()) {
                Some(snapshot) => Section::from(snapshot),
                None => Section::new(kind),
            })
            .collect();

        Document {
            title: Some(self.title),
            description: self.description,
            source_url: self.source_url,
            auto: self.auto,
            meta_data: self.meta_data,
            sections,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize document snapshot")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse document snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_orders_sections_and_fills_gaps() {
        let snapshot = DocumentSnapshot {
            title: "Doc".into(),
            description: None,
            source_url: None,
            auto: true,
            meta_data: DocumentMeta::named("Doc"),
            sections: vec![SectionSnapshot {
                kind: SectionKind::Summary,
                content: Some("s".into()),
                meta_data: BTreeMap::new(),
                requires_validation: false,
                passed: false,
                error_log: vec![],
                state: SectionState::Generated,
            }],
        };

        let document = snapshot.restore();
        let kinds: Vec<_> = document.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::ALL);
        assert_eq!(document.sections[2].content.as_deref(), Some("s"));
        assert!(document.sections[0].content.is_none());
    }

    #[test]
    fn test_json_uses_plain_field_names() {
        let mut document = Document::new(Some("Doc".into()), None, None, false);
        document.sections[1].content = Some("d".into());
        document.sections[1].error_log.push(ErrorEntry::now("boom"));

        let json = DocumentSnapshot::capture(&document).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"], "Doc");
        assert_eq!(value["sections"][1]["kind"], "Deployment");
        assert_eq!(value["sections"][1]["requires_validation"], true);
        assert_eq!(value["sections"][1]["error_log"][0]["error_message"], "boom");
    }
}
