//! # QuakeFeed - Core API Documentation
//!
//! QuakeFeed loads lists of seismic events from remote feeds and caches the
//! outcome across consumer lifecycle churn.
//!
//! ## Features
//!
//! - **Modular Architecture** with clearly defined components:
//!   - **Fetchers**: Retrieval and parsing of remote feeds (USGS, etc.)
//!   - **Loaders**: One cached fetch outcome per feed, delivered to the
//!     attached consumer without re-hitting the network on reattach
//!   - **Coordinator**: A registry routing lifecycle calls to the loader
//!     registered under a stable identifier
//!
//! The expensive part of showing a feed is fetching and parsing it, and the
//! most common reason to do so again is a consumer that merely detached and
//! reattached. A [`loader::Loader`] runs its fetcher once on the runtime's
//! background workers, keeps the outcome, and hands the cached value to
//! whichever consumer is attached when a delivery is due. Dropping the cache
//! is always an explicit act ([`loader::Loader::reset`]).
//!
//! ## Loading a feed
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use quakefeed::prelude::*;
//! use tokio::sync::mpsc;
//!
//! struct FeedFetcher;
//!
//! #[async_trait]
//! impl Fetcher for FeedFetcher {
//!     async fn fetch(&self, _url: &str) -> Result<Vec<EventRecord>, FetchError> {
//!         // network retrieval and parsing goes here
//!         Ok(vec![])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let coordinator = Coordinator::new(FeedFetcher);
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!
//!     let request = LoadRequest::new("recent", "https://example.org/feed?limit=10");
//!     coordinator.attach(request, tx);
//!
//!     match rx.recv().await {
//!         Some(LoadResult::Success(records)) => println!("{} events", records.len()),
//!         Some(LoadResult::Empty) => println!("feed is empty"),
//!         Some(LoadResult::Failure(e)) => eprintln!("load failed: {e}"),
//!         None => {}
//!     }
//! }
//! ```
//!
//! A consumer that detaches (`detach`) and later attaches again receives the
//! cached result immediately, and the fetcher is not invoked a second time.
//! Failed loads are cached the same way, so lifecycle churn after a network
//! error cannot turn into a fetch storm; an explicit `invalidate` is the only
//! way to force a refetch.

/// Loader registry and lifecycle routing
///
/// Maps stable identifiers to live loader instances, at most one per id.
pub mod coordinator;

/// Error types for all library operations
pub mod error;

/// The seismic event record produced by fetchers
pub mod event;

/// The remote fetch contract consumed by loaders
pub mod fetcher;

/// Result caching and delivery
///
/// Contains:
/// - The loader state machine (`Idle`/`Loading`/`Loaded`)
/// - The cached [`loader::LoadResult`] slot and its delivery rules
pub mod loader;

/// Convenience prelude exports
///
/// Re-exports commonly used types.
pub mod prelude;
