// Project-wide constants
//
// Centralised here so magic values have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Default number of validate/repair attempts for a testable section.
pub const DEFAULT_MAX_TEST_RUNS: usize = 8;

/// Default maximum tokens per generation request.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Azure OpenAI REST API version used when none is configured.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-12-01-preview";

/// Text returned in place of content when the backend rejects a request.
///
/// Callers must treat this as "nothing was generated", never as content.
pub const APOLOGY_SENTINEL: &str =
    "I'm sorry, but I'm not sure how to respond to that, try rephrasing.";

/// Validator output that means the cloud login has lapsed. Retrying cannot fix it.
pub const EXPIRED_CREDENTIAL_SIGNATURE: &str = "AADSTS70043: The refresh token has expired";

/// Shown to the user when the expired-credential signature is seen.
pub const REAUTH_HINT: &str =
    "The refresh token has expired. Please re-authenticate with the command `az login --use-device-code`.";

/// Directory (under the data dir) that holds one folder per document.
pub const DOCUMENT_DIR_NAME: &str = "Document";

/// Pseudo-section name used for the document's structured metadata.
pub const META_DATA_SECTION: &str = "meta_data";
