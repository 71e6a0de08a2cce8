use async_trait::async_trait;
use thiserror::Error;

use crate::event::EventRecord;

/// Errors a fetch attempt can surface.
///
/// Cloneable so a failed outcome can sit in a loader's cache slot and be
/// re-delivered like any other result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network request failed: {0}")]
    Network(String),
    #[error("malformed feed payload: {0}")]
    Parse(String),
    #[error("invalid load request: {0}")]
    InvalidRequest(String),
}

/// Retrieval and parsing of a remote feed.
///
/// One call per fetch attempt, and the returned value is final for that
/// attempt; loaders never retry on their own. Retry or timeout policy, if
/// any, belongs to the implementation. A bad URL must come back as
/// `Err(FetchError)` rather than a panic.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<EventRecord>, FetchError>;
}
