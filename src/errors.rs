// Structural error types
//
// Most of the crate works in `anyhow::Result`. The variants here are the
// failures a caller has to tell apart (tests match on them, the menu turns
// some of them into a "failed" backlog entry).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    /// A rename was requested but the artifact at the old path is gone.
    #[error("cannot rename: no artifact at {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// A rename would overwrite another saved document.
    #[error("cannot rename: a document named '{title}' already exists")]
    RenameTargetExists { title: String },

    /// Edited metadata did not parse as a JSON object with a `name` field.
    #[error("metadata is malformed: {reason}")]
    MalformedMetadata { reason: String },

    /// The backend declined to produce content for a section.
    #[error("no content was generated for the {section} section of '{title}'")]
    NoContent { title: String, section: String },

    /// Seed content could not be fetched.
    #[error("failed to fetch seed content from {url}: HTTP status {status}")]
    SeedFetch { url: String, status: u16 },

    /// Automatic generation needs a title up front.
    #[error("automatic generation requires a document title")]
    MissingTitle,

    /// The message list handed to the backend is unusable.
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
}

/// Helper for the common "configuration is missing a key" message.
pub fn missing_api_key_error() -> String {
    "No API key configured for the generation backend.\n\n\
     Add a [provider] section to ~/.docwright/config.toml:\n\n\
     \x20   [provider]\n\
     \x20   kind = \"openai\"\n\
     \x20   api_key = \"sk-...\"\n\n\
     or export AZURE_OPENAI_API_KEY / OPENAI_API_KEY."
        .to_string()
}
