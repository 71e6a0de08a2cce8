//! Loader registry and lifecycle routing.
//!
//! The coordinator keeps at most one live [`Loader`] per stable identifier
//! and forwards lifecycle calls to it. It holds no caching logic of its own;
//! detaching a consumer leaves the loader and its cache in place, so the
//! next attach under the same identifier is served from cache.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::fetcher::Fetcher;
use crate::loader::{LoadRequest, Loader, ResultSink};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no loader registered for id `{0}`")]
    UnknownLoader(String),
}

/// Registry mapping stable identifiers to loader instances.
pub struct Coordinator<F> {
    fetcher: Arc<F>,
    loaders: DashMap<String, Loader<F>>,
}

impl<F: Fetcher + 'static> Coordinator<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            loaders: DashMap::new(),
        }
    }

    /// Looks up the loader registered under `request.id`, creating it lazily
    /// on first reference, and attaches `sink` to it.
    ///
    /// An existing loader keeps its original request; the url of a repeated
    /// `attach` under the same id is ignored.
    pub fn attach(&self, request: LoadRequest, sink: ResultSink) -> Loader<F> {
        let id = request.id.clone();
        let loader = self
            .loaders
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(loader = %id, url = %request.url, "creating loader");
                Loader::new(request, Arc::clone(&self.fetcher))
            })
            .clone();

        loader.start(sink);
        loader
    }

    /// Detaches the consumer from the loader under `id`, keeping the loader
    /// and its cache alive for the next attach.
    pub fn detach(&self, id: &str) -> Result<(), CoordinatorError> {
        self.get(id)
            .ok_or_else(|| CoordinatorError::UnknownLoader(id.to_string()))?
            .stop();
        Ok(())
    }

    /// Resets the loader under `id`, discarding its cache so the next attach
    /// fetches anew.
    pub fn invalidate(&self, id: &str) -> Result<(), CoordinatorError> {
        self.get(id)
            .ok_or_else(|| CoordinatorError::UnknownLoader(id.to_string()))?
            .reset();
        Ok(())
    }

    /// Tears the loader under `id` down and removes it from the registry.
    ///
    /// The loader is reset first so that a still-running fetch cannot deliver
    /// into a registry entry that no longer exists.
    pub fn destroy(&self, id: &str) -> Result<(), CoordinatorError> {
        let (_, loader) = self
            .loaders
            .remove(id)
            .ok_or_else(|| CoordinatorError::UnknownLoader(id.to_string()))?;
        loader.reset();
        debug!(loader = %id, "destroyed");
        Ok(())
    }

    /// The loader registered under `id`, if any.
    pub fn get(&self, id: &str) -> Option<Loader<F>> {
        self.loaders.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
