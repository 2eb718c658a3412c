// Prompt builder
//
// Per-section user prompts, the revision/repair prompt shapes, and the
// system prompt library (files in the prompt dir override built-in defaults).

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::cli::Console;
use crate::document::Section;
use crate::providers::Message;
use crate::store::{read_optional, Artifact};

const DEFAULT_OVERVIEW_SYSTEM: &str = include_str!("system/Overview_system_prompt.txt");
const DEFAULT_DEPLOYMENT_SYSTEM: &str = include_str!("system/Deployment_system_prompt.txt");
const DEFAULT_SUMMARY_SYSTEM: &str = include_str!("system/Summary_system_prompt.txt");
const DEFAULT_META_DATA_SYSTEM: &str = include_str!("system/meta_data_system_prompt.txt");

/// The repair instruction prefixed to a validator diagnostic
pub const REPAIR_INSTRUCTION: &str = "Fix this error, thrown when executing the document.";

/// What a prompt builder may read about the document being generated
#[derive(Debug, Clone, Copy)]
pub struct DocumentView<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub auto: bool,
    /// Sections generated so far, in document order
    pub sections: &'a [Section],
}

impl DocumentView<'_> {
    /// Content of every section generated so far, in order
    pub fn generated_content(&self) -> String {
        self.sections
            .iter()
            .filter_map(|s| s.content.as_deref())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn description(&self) -> Option<&str> {
        self.description.filter(|d| !d.trim().is_empty())
    }
}

/// Overview: free-text guidance from the user, or an instruction synthesised
/// from the title and description.
pub fn overview_prompt(doc: &DocumentView<'_>, console: &dyn Console) -> Result<String> {
    let mut prompt = if !doc.auto && doc.description().is_none() {
        let mut guidance = console.ask(&format!(
            "Provide any guidance you have for the agent creating your document '{}'.\n",
            doc.title
        ))?;
        guidance.push_str("\n\n");
        guidance
    } else if let Some(description) = doc.description() {
        format!(
            "Write an overview for a document with the title '{}' and a description of content of '{}'.\n\n",
            doc.title, description
        )
    } else {
        format!(
            "Write an overview for a document with the title '{}'.\n\n",
            doc.title
        )
    };

    let mut content = format!("# {}\n\n", doc.title);
    content.push_str(&doc.generated_content());
    prompt.push_str("Current content of the document is:\n\n ");
    prompt.push_str(&content);
    Ok(prompt)
}

/// Deployment: special instructions from the user, or a fixed instruction.
pub fn deployment_prompt(doc: &DocumentView<'_>, console: &dyn Console) -> Result<String> {
    let mut prompt = if !doc.auto {
        let mut answer = console.ask(&format!(
            "Provide any special instructions for the deployment section of the document titled {}.\n",
            doc.title
        ))?;
        answer.push_str("\n\nCurrent content of the document:\n\n ");
        answer
    } else {
        "Write the deployment section for the document below:\n\n".to_string()
    };

    prompt.push_str(&doc.generated_content());
    Ok(prompt)
}

/// Summary: always a fixed instruction, optionally extended by the user.
pub fn summary_prompt(doc: &DocumentView<'_>, console: &dyn Console) -> Result<String> {
    let mut prompt = "Write a summary section for the document below:\n\n".to_string();

    if !doc.auto {
        prompt.push_str(&console.ask("Any special instructions for the summary section?")?);
    }

    prompt.push_str("\n\n");
    prompt.push_str(&doc.generated_content());
    Ok(prompt)
}

/// User message for a fresh section
pub fn generation_request(section_name: &str, prompt: &str) -> String {
    format!("Generate a {}. \n{}.", section_name, prompt)
}

/// Request body that asks the backend to fix a validator failure
pub fn repair_request(diagnostic: &str) -> String {
    format!("{}\n\n{}", REPAIR_INSTRUCTION, diagnostic)
}

/// User message for an edit of existing content
pub fn revision_prompt(system_prompt: &str, request: &str, content: &str) -> String {
    format!(
        "{}\n\nEdit the content below to reflect the following changes:\n\n{}\n\n{}",
        system_prompt, request, content
    )
}

/// System prompts by section name
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<Name>_system_prompt.txt`, or the built-in default
    pub fn system_prompt(&self, artifact: Artifact) -> Result<String> {
        let path = self
            .dir
            .join(format!("{}_system_prompt.txt", artifact.name()));
        if let Some(text) = read_optional(&path)
            .with_context(|| format!("Failed to read system prompt {}", path.display()))?
        {
            tracing::debug!("Using system prompt override {}", path.display());
            return Ok(text);
        }

        let default = match artifact {
            Artifact::Section(kind) => match kind {
                crate::document::SectionKind::Overview => DEFAULT_OVERVIEW_SYSTEM,
                crate::document::SectionKind::Deployment => DEFAULT_DEPLOYMENT_SYSTEM,
                crate::document::SectionKind::Summary => DEFAULT_SUMMARY_SYSTEM,
            },
            Artifact::MetaData => DEFAULT_META_DATA_SYSTEM,
        };
        Ok(default.to_string())
    }

    pub fn system_message(&self, artifact: Artifact) -> Result<Message> {
        Ok(Message::system(self.system_prompt(artifact)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SectionKind;
    use crate::testing::ScriptedConsole;

    fn generated(kind: SectionKind, content: &str) -> Section {
        let mut section = Section::new(kind);
        section.content = Some(content.to_string());
        section
    }

    #[test]
    fn test_overview_auto_uses_title_and_description() {
        let console = ScriptedConsole::new(Vec::<String>::new());
        let view = DocumentView {
            title: "Create a VM",
            description: Some("A Linux VM in UK South"),
            auto: true,
            sections: &[],
        };
        let prompt = overview_prompt(&view, &console).unwrap();
        assert!(prompt.starts_with(
            "Write an overview for a document with the title 'Create a VM' and a description of content of 'A Linux VM in UK South'."
        ));
        assert!(prompt.contains("# Create a VM"));
        assert!(console.questions().is_empty());
    }

    #[test]
    fn test_overview_interactive_without_description_asks() {
        let console = ScriptedConsole::new(["Focus on cost"]);
        let view = DocumentView {
            title: "Create a VM",
            description: None,
            auto: false,
            sections: &[],
        };
        let prompt = overview_prompt(&view, &console).unwrap();
        assert!(prompt.starts_with("Focus on cost\n\nCurrent content of the document is:"));
        assert_eq!(console.questions().len(), 1);
    }

    #[test]
    fn test_overview_interactive_with_description_does_not_ask() {
        let console = ScriptedConsole::new(Vec::<String>::new());
        let view = DocumentView {
            title: "T",
            description: Some("D"),
            auto: false,
            sections: &[],
        };
        overview_prompt(&view, &console).unwrap();
        assert!(console.questions().is_empty());
    }

    #[test]
    fn test_deployment_auto_embeds_prior_sections() {
        let console = ScriptedConsole::new(Vec::<String>::new());
        let sections = [generated(SectionKind::Overview, "## Overview\nA VM.")];
        let view = DocumentView {
            title: "T",
            description: None,
            auto: true,
            sections: &sections,
        };
        let prompt = deployment_prompt(&view, &console).unwrap();
        assert_eq!(
            prompt,
            "Write the deployment section for the document below:\n\n## Overview\nA VM."
        );
    }

    #[test]
    fn test_deployment_interactive_prefixes_instructions() {
        let console = ScriptedConsole::new(["Use westeurope"]);
        let sections = [generated(SectionKind::Overview, "O")];
        let view = DocumentView {
            title: "T",
            description: None,
            auto: false,
            sections: &sections,
        };
        let prompt = deployment_prompt(&view, &console).unwrap();
        assert_eq!(
            prompt,
            "Use westeurope\n\nCurrent content of the document:\n\n O"
        );
    }

    #[test]
    fn test_summary_always_has_fixed_instruction() {
        let sections = [
            generated(SectionKind::Overview, "O"),
            generated(SectionKind::Deployment, "D"),
        ];
        let auto = DocumentView {
            title: "T",
            description: None,
            auto: true,
            sections: &sections,
        };
        let console = ScriptedConsole::new(Vec::<String>::new());
        let prompt = summary_prompt(&auto, &console).unwrap();
        assert_eq!(
            prompt,
            "Write a summary section for the document below:\n\n\n\nO\n\nD"
        );

        let interactive = DocumentView {
            auto: false,
            ..auto
        };
        let console = ScriptedConsole::new(["Mention cleanup"]);
        let prompt = summary_prompt(&interactive, &console).unwrap();
        assert!(prompt.starts_with("Write a summary section for the document below:\n\nMention cleanup"));
    }

    #[test]
    fn test_generated_content_skips_empty_sections() {
        let sections = [generated(SectionKind::Overview, "O"), Section::new(SectionKind::Deployment)];
        let view = DocumentView {
            title: "T",
            description: None,
            auto: true,
            sections: &sections,
        };
        assert_eq!(view.generated_content(), "O");
    }

    #[test]
    fn test_request_shapes() {
        assert_eq!(
            generation_request("Summary", "Write it"),
            "Generate a Summary. \nWrite it."
        );
        assert_eq!(
            repair_request("exit status 1"),
            "Fix this error, thrown when executing the document.\n\nexit status 1"
        );
        assert_eq!(
            revision_prompt("SYS", "shorter", "BODY"),
            "SYS\n\nEdit the content below to reflect the following changes:\n\nshorter\n\nBODY"
        );
    }

    #[test]
    fn test_system_prompt_override_and_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Summary_system_prompt.txt"), "custom").unwrap();
        let library = PromptLibrary::new(dir.path());

        assert_eq!(
            library
                .system_prompt(Artifact::Section(SectionKind::Summary))
                .unwrap(),
            "custom"
        );
        let deployment = library
            .system_prompt(Artifact::Section(SectionKind::Deployment))
            .unwrap();
        assert!(deployment.contains("## Deployment"));
        let meta = library.system_prompt(Artifact::MetaData).unwrap();
        assert!(meta.contains("\"name\""));
    }
}
