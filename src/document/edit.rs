// Edit loop - interactive revision of a persisted artifact
//
// The user can edit the file directly, type a change request that is sent to
// the backend as a revision prompt, or carry on without changes. Only a
// backend revision (or a metadata rename) counts as a change.

use anyhow::Result;

use super::section::SectionKind;
use super::{DocumentMeta, Workbench};
use crate::generators::Generation;
use crate::prompts::revision_prompt;
use crate::providers::Message;
use crate::store::Artifact;

fn choices_prompt(name: &str) -> String {
    format!(
        "{} created and opened in the editor. You can now take one of three actions:\n\
         \t1) Edit the file, save, hit enter here to proceed.\n\
         \t2) Type a prompt for desired changes here and hit enter.\n\
         \t3) Continue without changes (press enter).\n",
        name
    )
}

/// Ask the user what to do with an artifact. Returns the trimmed change request.
fn ask_for_request(bench: &Workbench, title: &str, artifact: Artifact) -> Result<String> {
    let path = bench.store.artifact_path(title, artifact);
    bench.console.open_for_editing(&path)?;
    let answer = bench.console.ask(&choices_prompt(artifact.name()))?;
    Ok(answer.trim().to_string())
}

/// Send a revision prompt for the stored artifact. Returns the revised text,
/// or `None` when the backend produced nothing.
async fn revise(
    bench: &Workbench,
    title: &str,
    artifact: Artifact,
    request: &str,
) -> Result<Option<String>> {
    let content = bench.store.load(title, artifact)?.unwrap_or_default();
    let system = bench.prompts.system_prompt(artifact)?;
    let messages = vec![
        Message::system(system.clone()),
        Message::user(revision_prompt(&system, request, &content)),
    ];

    bench
        .console
        .info(&format!("Revising {}: {}", artifact.name(), request));
    match bench.generator.generate(messages).await? {
        Generation::Content(text) => Ok(Some(text)),
        Generation::Apology => {
            bench.console.warning(&format!(
                "No revision was produced for {}; keeping the current content.",
                artifact.name()
            ));
            Ok(None)
        }
    }
}

/// One pass of the edit loop for a section.
///
/// With `repair` set, the repair request is sent without waiting for the user
/// in automatic mode; interactively the user can add guidance to it first.
/// Returns true iff the backend revised the content.
pub async fn edit_section(
    bench: &Workbench,
    title: &str,
    kind: SectionKind,
    auto: bool,
    repair: Option<&str>,
) -> Result<bool> {
    let artifact = Artifact::Section(kind);

    let request = match (repair, auto) {
        (Some(repair), true) => repair.to_string(),
        (Some(repair), false) => {
            let guidance = bench.console.ask(
                "Add any guidance for fixing this error (press enter to send the error as-is)",
            )?;
            let guidance = guidance.trim();
            if guidance.is_empty() {
                repair.to_string()
            } else {
                format!("{}\n\n{}", repair, guidance)
            }
        }
        (None, true) => return Ok(false),
        (None, false) => ask_for_request(bench, title, artifact)?,
    };

    if request.is_empty() {
        return Ok(false);
    }

    match revise(bench, title, artifact, &request).await? {
        Some(text) => {
            bench.store.save(title, artifact, &text)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// One pass of the edit loop for the metadata artifact.
///
/// If the stored `name` no longer matches `title` (after a revision or a
/// manual edit), every artifact is moved under the new name and `title` is
/// updated. Returns true iff the metadata was revised or the document renamed.
pub async fn edit_metadata(bench: &Workbench, title: &mut String, auto: bool) -> Result<bool> {
    let artifact = Artifact::MetaData;
    let mut changed = false;

    let request = if auto {
        String::new()
    } else {
        ask_for_request(bench, title, artifact)?
    };

    if !request.is_empty() {
        if let Some(text) = revise(bench, title, artifact, &request).await? {
            DocumentMeta::parse(&text)?;
            bench.store.save(title, artifact, &text)?;
            changed = true;
        }
    }

    let raw = bench.store.load(title, artifact)?.unwrap_or_default();
    let meta = DocumentMeta::parse(&raw)?;
    if meta.name != *title {
        bench.console.info(&format!(
            "Name changed from {} to {}. Moving files...",
            title, meta.name
        ));
        bench.store.rename_document(title, &meta.name)?;
        *title = meta.name;
        changed = true;
    }

    Ok(changed)
}
