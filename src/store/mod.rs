// Content store - per-document artifacts on disk
//
// Layout, relative to the data dir:
//
//   Document/<t>/<t>.json              full document snapshot
//   Document/<t>/<t>.md                rendered document
//   Document/<t>/<t>_<Section>.md      one file per section
//   Document/<t>/<t>_meta_data.json    structured metadata
//
// where <t> is the sanitised title. Every write goes to a temporary sibling
// first and is renamed into place, so a reader never sees half a file.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::constants::{DOCUMENT_DIR_NAME, META_DATA_SECTION};
use crate::document::SectionKind;
use crate::errors::DocError;

static UNSAFE_TITLE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N} ._]").expect("static regex"));

/// Turn a document title into a directory/file stem.
///
/// Letters, digits, space, `.` and `_` are kept; anything else becomes `_`.
/// A stem made only of dots would name the current or parent directory, so
/// its dots become `_` too.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = UNSAFE_TITLE_CHARS.replace_all(title, "_");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else if trimmed.chars().all(|c| c == '.') {
        "_".repeat(trimmed.len())
    } else {
        trimmed.to_string()
    }
}

/// One persisted piece of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Section(SectionKind),
    MetaData,
}

impl Artifact {
    /// Name used in file names and system-prompt lookup
    pub fn name(&self) -> &'static str {
        match self {
            Artifact::Section(kind) => kind.name(),
            Artifact::MetaData => META_DATA_SECTION,
        }
    }

    fn is_json(&self) -> bool {
        matches!(self, Artifact::MetaData)
    }

    fn suffix(&self) -> String {
        let ext = if self.is_json() { "json" } else { "md" };
        format!("_{}.{}", self.name(), ext)
    }
}

/// Filesystem-backed store rooted at `<data_dir>/Document`
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join(DOCUMENT_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding every artifact of a document
    pub fn document_dir(&self, title: &str) -> PathBuf {
        self.root.join(sanitize_title(title))
    }

    pub fn artifact_path(&self, title: &str, artifact: Artifact) -> PathBuf {
        let stem = sanitize_title(title);
        self.root
            .join(&stem)
            .join(format!("{}{}", stem, artifact.suffix()))
    }

    pub fn snapshot_path(&self, title: &str) -> PathBuf {
        let stem = sanitize_title(title);
        self.root.join(&stem).join(format!("{}.json", stem))
    }

    pub fn markdown_path(&self, title: &str) -> PathBuf {
        let stem = sanitize_title(title);
        self.root.join(&stem).join(format!("{}.md", stem))
    }

    /// Load an artifact; `None` when it has never been saved
    pub fn load(&self, title: &str, artifact: Artifact) -> Result<Option<String>> {
        read_optional(&self.artifact_path(title, artifact))
    }

    /// Replace an artifact's contents. JSON artifacts are validated and pretty-printed.
    pub fn save(&self, title: &str, artifact: Artifact, data: &str) -> Result<PathBuf> {
        let contents = if artifact.is_json() {
            let value: serde_json::Value =
                serde_json::from_str(data).map_err(|e| DocError::MalformedMetadata {
                    reason: e.to_string(),
                })?;
            serde_json::to_string_pretty(&value).context("Failed to format metadata")?
        } else {
            data.to_string()
        };

        let path = self.artifact_path(title, artifact);
        write_atomic(&path, &contents)?;
        tracing::debug!("Saved {} ({} bytes)", path.display(), contents.len());
        Ok(path)
    }

    /// Remove one artifact. Returns whether anything was deleted.
    pub fn delete(&self, title: &str, artifact: Artifact) -> Result<bool> {
        remove_if_exists(&self.artifact_path(title, artifact))
    }

    /// Remove a document's whole folder
    pub fn remove_document(&self, title: &str) -> Result<bool> {
        let dir = self.document_dir(title);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to remove {}", dir.display()))?;
        tracing::info!("Removed {}", dir.display());
        Ok(true)
    }

    /// Titles of every document with a saved snapshot, sorted
    pub fn list_documents(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {}", self.root.display()))
            }
        };

        let mut titles = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().join(format!("{}.json", name)).is_file() {
                titles.push(name);
            }
        }
        titles.sort();
        Ok(titles)
    }

    /// Move every artifact of `old_title` under `new_title`.
    ///
    /// The old metadata artifact must exist and `new_title` must not already
    /// hold a document. The old folder is removed once it is empty.
    pub fn rename_document(&self, old_title: &str, new_title: &str) -> Result<()> {
        let old_stem = sanitize_title(old_title);
        let new_stem = sanitize_title(new_title);
        if old_stem == new_stem {
            return Ok(());
        }

        let old_meta = self.artifact_path(old_title, Artifact::MetaData);
        if !old_meta.exists() {
            return Err(DocError::MissingArtifact { path: old_meta }.into());
        }

        let new_meta = self.artifact_path(new_title, Artifact::MetaData);
        let new_snapshot = self.snapshot_path(new_title);
        if new_meta.exists() || new_snapshot.exists() {
            return Err(DocError::RenameTargetExists { title: new_stem }.into());
        }

        let old_dir = self.document_dir(old_title);
        let new_dir = self.document_dir(new_title);
        fs::create_dir_all(&new_dir)
            .with_context(|| format!("Failed to create {}", new_dir.display()))?;

        for entry in fs::read_dir(&old_dir)
            .with_context(|| format!("Failed to list {}", old_dir.display()))?
        {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(rest) = file_name.strip_prefix(&old_stem) else {
                continue;
            };
            if !(rest.starts_with('_') || rest.starts_with('.')) {
                continue;
            }
            let target = new_dir.join(format!("{}{}", new_stem, rest));
            fs::rename(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to move {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }

        if fs::read_dir(&old_dir)?.next().is_none() {
            fs::remove_dir(&old_dir)
                .with_context(|| format!("Failed to remove {}", old_dir.display()))?;
        }

        tracing::info!("Renamed document '{}' to '{}'", old_stem, new_stem);
        Ok(())
    }
}

/// Read a file, mapping "not found" to `None`
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Write via a temporary sibling + rename
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let tmp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}
