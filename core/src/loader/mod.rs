//! Result caching and delivery.
//!
//! A [`Loader`] runs its fetcher at most once per logical load and keeps the
//! outcome. Consumers attach and detach as their own lifecycle dictates;
//! reattaching to a loaded loader hands back the cached result instead of
//! re-hitting the network.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::event::EventRecord;
use crate::fetcher::{FetchError, Fetcher};

/// Delivery target registered by a consumer through [`Loader::start`].
pub type ResultSink = UnboundedSender<LoadResult>;

/// Immutable fetch parameters bound to a loader at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Stable identifier the loader is registered under.
    pub id: String,
    /// Feed URL handed to the fetcher verbatim.
    pub url: String,
}

impl LoadRequest {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Outcome of one fetch attempt.
///
/// Exactly one of these is cached per loader; a completed fetch overwrites
/// the slot, it never merges.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult {
    /// The feed yielded records, in feed order.
    Success(Vec<EventRecord>),
    /// The fetch succeeded but the feed held no records.
    Empty,
    /// The fetch failed. Cached like any other outcome.
    Failure(FetchError),
}

impl LoadResult {
    fn from_fetch(outcome: Result<Vec<EventRecord>, FetchError>) -> Self {
        match outcome {
            Ok(records) if records.is_empty() => Self::Empty,
            Ok(records) => Self::Success(records),
            Err(e) => Self::Failure(e),
        }
    }
}

/// Lifecycle state of a [`Loader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Constructed, never started, or reset.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// A cached result is present and no fetch is in flight.
    Loaded,
}

struct Inner {
    state: LoadState,
    cached: Option<LoadResult>,
    sink: Option<ResultSink>,
    /// Bumped on every reset; an in-flight fetch completion is applied only
    /// if its snapshot still matches.
    generation: u64,
}

impl Inner {
    fn deliver(&self, result: LoadResult) {
        if let Some(sink) = &self.sink {
            // the consumer may be gone already
            let _ = sink.send(result);
        }
    }
}

struct Shared<F> {
    request: LoadRequest,
    fetcher: Arc<F>,
    inner: Mutex<Inner>,
}

/// Caches the outcome of one logical fetch and mediates delivery to the
/// attached consumer.
///
/// A `Loader` is a cheap handle; clones share the same state. All state
/// mutation happens under one short-lived lock, so `start`, `stop`, `reset`
/// and the application of fetch completions are serialized with each other
/// and none of them blocks on I/O.
pub struct Loader<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for Loader<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: Fetcher + 'static> Loader<F> {
    pub fn new(request: LoadRequest, fetcher: Arc<F>) -> Self {
        Self {
            shared: Arc::new(Shared {
                request,
                fetcher,
                inner: Mutex::new(Inner {
                    state: LoadState::Idle,
                    cached: None,
                    sink: None,
                    generation: 0,
                }),
            }),
        }
    }

    /// The request this loader was constructed with.
    pub fn request(&self) -> &LoadRequest {
        &self.shared.request
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoadState {
        self.lock().state
    }

    /// The cached result, if a fetch has completed since the last reset.
    pub fn cached(&self) -> Option<LoadResult> {
        self.lock().cached.clone()
    }

    /// Registers `sink` as the delivery target and makes sure a result is on
    /// its way.
    ///
    /// With a cached result present it is delivered immediately and the
    /// fetcher stays untouched, so a consumer restart costs no network work.
    /// With a fetch already in flight this only rebinds the sink; whichever
    /// sink is registered when the fetch completes receives the result.
    /// Otherwise a fetch is spawned on the runtime's background workers.
    pub fn start(&self, sink: ResultSink) {
        let mut inner = self.lock();
        inner.sink = Some(sink);

        match inner.state {
            LoadState::Loaded => {
                let cached = inner
                    .cached
                    .clone()
                    .expect("loaded loader holds a cached result");
                debug!(loader = %self.shared.request.id, "delivering cached result");
                inner.deliver(cached);
            }
            LoadState::Loading => {
                debug!(loader = %self.shared.request.id, "fetch in flight, rebinding sink");
            }
            LoadState::Idle => {
                if self.shared.request.url.is_empty() {
                    let result = LoadResult::Failure(FetchError::InvalidRequest(
                        "request url is empty".to_string(),
                    ));
                    inner.state = LoadState::Loaded;
                    inner.cached = Some(result.clone());
                    inner.deliver(result);
                    return;
                }

                inner.state = LoadState::Loading;
                let generation = inner.generation;
                drop(inner);
                self.spawn_fetch(generation);
            }
        }
    }

    /// Detaches the current sink.
    ///
    /// An in-flight fetch keeps running; its result is cached on completion
    /// and delivered to whoever attaches next. The cache is untouched.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.sink = None;
        debug!(loader = %self.shared.request.id, "sink detached");
    }

    /// Drops the cached result, detaches the sink and returns to `Idle`.
    ///
    /// An in-flight fetch from before the reset completes into the void: its
    /// generation no longer matches, so its result is discarded rather than
    /// delivered.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = LoadState::Idle;
        inner.cached = None;
        inner.sink = None;
        debug!(loader = %self.shared.request.id, generation = inner.generation, "reset");
    }

    fn spawn_fetch(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        debug!(loader = %shared.request.id, generation, "spawning fetch");

        tokio::spawn(async move {
            let outcome = shared.fetcher.fetch(&shared.request.url).await;
            let result = LoadResult::from_fetch(outcome);

            let mut inner = shared.inner.lock().expect("loader state lock poisoned");
            if inner.generation != generation {
                debug!(loader = %shared.request.id, generation, "dropping stale fetch result");
                return;
            }
            inner.state = LoadState::Loaded;
            inner.cached = Some(result.clone());
            debug!(loader = %shared.request.id, "fetch complete");
            inner.deliver(result);
        });
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().expect("loader state lock poisoned")
    }
}
