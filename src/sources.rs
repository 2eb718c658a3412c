// Seed content fetch

use anyhow::{Context, Result};

use crate::errors::DocError;

/// Fetch the raw text at `url`. Anything but HTTP 200 is a `DocError::SeedFetch`.
pub async fn fetch_seed(client: &reqwest::Client, url: &str) -> Result<String> {
    tracing::debug!("Fetching seed content from {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request seed content from {}", url))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(DocError::SeedFetch {
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into());
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to read seed content from {}", url))
}

/// Fold fetched seed text into a document description as guidance
pub fn fold_into_description(description: Option<&str>, seed: &str) -> String {
    match description.filter(|d| !d.trim().is_empty()) {
        Some(description) => format!(
            "{}\n\nUse the following content as a guide:\n\n{}",
            description, seed
        ),
        None => format!("Use the following content as a guide:\n\n{}", seed),
    }
}
