// Unified generator interface
//
// The document layer asks a `Generator` for text and gets back either
// content or an apology. Backend failures never surface as errors here:
// the only `Err` a generator returns is for a malformed request.

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;

use crate::config::constants::APOLOGY_SENTINEL;
use crate::errors::DocError;
use crate::providers::{Message, Role, StreamChunk};

pub mod provider;

pub use provider::ProviderGenerator;

/// Unified generator interface
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one stateless request
    async fn generate(&self, messages: Vec<Message>) -> Result<Generation>;

    /// Generator name for logging
    fn name(&self) -> &str;
}

/// Outcome of one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Usable text
    Content(String),
    /// The backend rejected the request or produced no text
    Apology,
}

impl Generation {
    /// The generated text, if any
    pub fn into_content(self) -> Option<String> {
        match self {
            Generation::Content(text) => Some(text),
            Generation::Apology => None,
        }
    }

    pub fn is_apology(&self) -> bool {
        matches!(self, Generation::Apology)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::Content(text) => f.write_str(text),
            Generation::Apology => f.write_str(APOLOGY_SENTINEL),
        }
    }
}

/// Reject message lists no backend could make sense of.
///
/// This is a programming error upstream, so it propagates instead of
/// turning into an apology.
pub fn validate_messages(messages: &[Message]) -> std::result::Result<(), DocError> {
    let last = messages
        .last()
        .ok_or_else(|| DocError::InvalidRequest("no messages".to_string()))?;

    if last.role != Role::User {
        return Err(DocError::InvalidRequest(format!(
            "last message must come from the user, found {}",
            last.role
        )));
    }

    if let Some(idx) = messages
        .iter()
        .position(|m| m.role == Role::User && m.content.trim().is_empty())
    {
        return Err(DocError::InvalidRequest(format!(
            "user message {} has no content",
            idx
        )));
    }

    Ok(())
}

/// Drain a stream of chunks, concatenating text deltas in arrival order.
///
/// Returns `Ok(None)` when the stream carried no text at all.
pub async fn collect_stream(
    mut rx: mpsc::Receiver<Result<StreamChunk>>,
) -> Result<Option<String>> {
    let mut text = String::new();
    while let Some(chunk) = rx.recv().await {
        match chunk? {
            StreamChunk::TextDelta(delta) => text.push_str(&delta),
            StreamChunk::Finished { stop_reason } => {
                tracing::debug!("Stream finished: {:?}", stop_reason);
            }
        }
    }

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_list() {
        assert!(matches!(
            validate_messages(&[]),
            Err(DocError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_requires_trailing_user_message() {
        let messages = vec![Message::user("hi"), Message::system("sys")];
        assert!(validate_messages(&messages).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_user_content() {
        let messages = vec![Message::system("sys"), Message::user("   ")];
        assert!(validate_messages(&messages).is_err());
    }

    #[test]
    fn test_validate_accepts_system_then_user() {
        let messages = vec![Message::system(""), Message::user("Generate a Summary.")];
        assert!(validate_messages(&messages).is_ok());
    }

    #[test]
    fn test_apology_displays_sentinel() {
        assert_eq!(Generation::Apology.to_string(), APOLOGY_SENTINEL);
        assert!(Generation::Apology.into_content().is_none());
        assert_eq!(
            Generation::Content("x".into()).into_content().as_deref(),
            Some("x")
        );
    }

    #[tokio::test]
    async fn test_collect_stream_preserves_order() {
        let (tx, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            for part in ["# Dep", "loy", "ment\n"] {
                tx.send(Ok(StreamChunk::TextDelta(part.to_string())))
                    .await
                    .unwrap();
            }
            tx.send(Ok(StreamChunk::Finished {
                stop_reason: Some("stop".into()),
            }))
            .await
            .unwrap();
        });
        let text = collect_stream(rx).await.unwrap();
        assert_eq!(text.as_deref(), Some("# Deployment\n"));
    }

    #[tokio::test]
    async fn test_collect_stream_without_text_is_none() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        assert!(collect_stream(rx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collect_stream_propagates_errors() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(Ok(StreamChunk::TextDelta("partial".into())))
            .await
            .unwrap();
        tx.send(Err(anyhow::anyhow!("connection reset"))).await.unwrap();
        drop(tx);
        assert!(collect_stream(rx).await.is_err());
    }
}
