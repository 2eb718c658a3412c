// Idea backlog - document requests waiting to be generated
//
// Three JSON lists under the ideas dir: candidates.json (not generated yet),
// failed.json (generated, validation failed) and passed.json.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::write_atomic;

/// Placeholder for a missing title or description
pub const TO_BE_CONFIRMED: &str = "TBC";

fn tbc() -> String {
    TO_BE_CONFIRMED.to_string()
}

/// A single document request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaEntry {
    #[serde(default = "tbc")]
    pub title: String,

    #[serde(default = "tbc")]
    pub description: String,

    /// Markdown path of the generated document, once there is one
    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub tests_passed: bool,
}

impl IdeaEntry {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            filename: None,
            tests_passed: false,
        }
    }
}

/// Which list an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Candidates,
    Failed,
    Passed,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Candidates, Bucket::Failed, Bucket::Passed];

    fn file_name(&self) -> &'static str {
        match self {
            Bucket::Candidates => "candidates.json",
            Bucket::Failed => "failed.json",
            Bucket::Passed => "passed.json",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Bucket::Candidates => "candidates",
            Bucket::Failed => "failed",
            Bucket::Passed => "passed",
        };
        f.write_str(s)
    }
}

/// Manages the three backlog files
pub struct IdeaBacklog {
    dir: PathBuf,
}

impl IdeaBacklog {
    /// Open the backlog, creating missing files and normalising every entry
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let backlog = Self { dir: dir.into() };
        fs::create_dir_all(&backlog.dir)
            .with_context(|| format!("Failed to create {}", backlog.dir.display()))?;

        for bucket in Bucket::ALL {
            let entries = backlog.entries(bucket)?;
            tracing::debug!("{} {} entries", entries.len(), bucket);
            backlog.write(bucket, &entries)?;
        }
        Ok(backlog)
    }

    pub fn path(&self, bucket: Bucket) -> PathBuf {
        self.dir.join(bucket.file_name())
    }

    /// Entries in a bucket; a missing file is an empty list
    pub fn entries(&self, bucket: Bucket) -> Result<Vec<IdeaEntry>> {
        read_entries(&self.path(bucket))
    }

    pub fn add_candidate(&self, title: &str, description: &str) -> Result<IdeaEntry> {
        let entry = IdeaEntry::new(title, description);
        let mut candidates = self.entries(Bucket::Candidates)?;
        candidates.push(entry.clone());
        self.write(Bucket::Candidates, &candidates)?;
        tracing::info!("Added candidate '{}'", title);
        Ok(entry)
    }

    /// Move entry `index` of `from` into `passed` or `failed`, recording the
    /// generated file.
    pub fn record_outcome(
        &self,
        from: Bucket,
        index: usize,
        filename: &Path,
        passed: bool,
    ) -> Result<IdeaEntry> {
        let mut source = self.entries(from)?;
        if index >= source.len() {
            anyhow::bail!("No {} entry at position {}", from, index + 1);
        }
        let mut entry = source.remove(index);
        entry.filename = Some(filename.display().to_string());
        entry.tests_passed = passed;

        let target = if passed { Bucket::Passed } else { Bucket::Failed };
        if target == from {
            source.insert(index, entry.clone());
            self.write(from, &source)?;
        } else {
            let mut destination = self.entries(target)?;
            destination.push(entry.clone());
            self.write(target, &destination)?;
            self.write(from, &source)?;
        }

        tracing::info!("Recorded '{}' as {}", entry.title, target);
        Ok(entry)
    }

    fn write(&self, bucket: Bucket, entries: &[IdeaEntry]) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize idea backlog")?;
        write_atomic(&self.path(bucket), &contents)
    }
}

fn read_entries(path: &Path) -> Result<Vec<IdeaEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read idea backlog from {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse idea backlog {}", path.display()))
}
