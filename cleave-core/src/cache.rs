//! Read-through cache of recently fetched body graphs.
//!
//! The cache is an explicit capability: callers construct it at service start,
//! pass it wherever a [`GraphSource`] is expected and drop it at shutdown.
//! Each entry remembers the store version it was fetched at; asking for any
//! other version evicts the entry and fetches again.

use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;
use tracing::{instrument, trace};

use crate::{
    error::GraphSourceError,
    graph::RawBodyGraph,
    ids::{BodyId, StoreVersion},
    source::GraphSource,
};

/// Configuration for [`CachedGraphSource`].
///
/// # Examples
/// ```
/// use cleave_core::GraphCacheConfig;
/// use std::num::NonZeroUsize;
///
/// let config = GraphCacheConfig::default().with_max_bodies(NonZeroUsize::new(8).unwrap());
/// assert_eq!(config.max_bodies().get(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphCacheConfig {
    max_bodies: NonZeroUsize,
}

impl GraphCacheConfig {
    /// Default number of bodies retained before eviction.
    pub const DEFAULT_MAX_BODIES: NonZeroUsize = NonZeroUsize::MIN.saturating_add(63);

    /// Builds a configuration retaining at most `max_bodies` graphs.
    #[must_use]
    pub const fn new(max_bodies: NonZeroUsize) -> Self {
        Self { max_bodies }
    }

    /// Updates the number of bodies retained before eviction.
    #[must_use]
    pub const fn with_max_bodies(mut self, max_bodies: NonZeroUsize) -> Self {
        self.max_bodies = max_bodies;
        self
    }

    /// Returns the number of bodies retained before eviction.
    #[must_use]
    #[rustfmt::skip]
    pub const fn max_bodies(&self) -> NonZeroUsize { self.max_bodies }
}

impl Default for GraphCacheConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_BODIES)
    }
}

#[derive(Debug, Clone)]
struct CachedGraph {
    version: StoreVersion,
    graph: RawBodyGraph,
}

/// [`GraphSource`] wrapper keeping the most recently used body graphs.
///
/// # Examples
/// ```
/// use cleave_core::{
///     BodyId, CachedGraphSource, GraphCacheConfig, GraphSource, GraphSourceError, RawBodyGraph,
///     StoreVersion,
/// };
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// #[derive(Default)]
/// struct Counting(AtomicUsize);
///
/// impl GraphSource for Counting {
///     fn name(&self) -> &str { "counting" }
///     fn fetch_body_graph(
///         &self,
///         body: BodyId,
///         _version: &StoreVersion,
///     ) -> Result<RawBodyGraph, GraphSourceError> {
///         self.0.fetch_add(1, Ordering::Relaxed);
///         Ok(RawBodyGraph::from_edges(body, Vec::new()))
///     }
/// }
///
/// let cache = CachedGraphSource::new(Counting::default(), GraphCacheConfig::default());
/// let v1 = StoreVersion::new("v1");
/// cache.fetch_body_graph(BodyId::new(7), &v1)?;
/// cache.fetch_body_graph(BodyId::new(7), &v1)?;
/// assert_eq!(cache.inner().0.load(Ordering::Relaxed), 1);
/// cache.fetch_body_graph(BodyId::new(7), &StoreVersion::new("v2"))?;
/// assert_eq!(cache.inner().0.load(Ordering::Relaxed), 2);
/// # Ok::<(), GraphSourceError>(())
/// ```
#[derive(Debug)]
pub struct CachedGraphSource<S> {
    inner: S,
    entries: Mutex<LruCache<BodyId, CachedGraph>>,
    config: GraphCacheConfig,
}

impl<S: GraphSource> CachedGraphSource<S> {
    /// Wraps `inner` with a cache sized by `config`.
    pub fn new(inner: S, config: GraphCacheConfig) -> Self {
        Self {
            inner,
            entries: Mutex::new(LruCache::new(config.max_bodies())),
            config,
        }
    }

    /// Returns the wrapped source.
    #[must_use]
    #[rustfmt::skip]
    pub fn inner(&self) -> &S { &self.inner }

    /// Returns the cache configuration.
    #[must_use]
    #[rustfmt::skip]
    pub fn config(&self) -> GraphCacheConfig { self.config }

    /// Returns the number of cached bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops the cached graph of `body`, returning whether one was present.
    pub fn invalidate(&self, body: BodyId) -> bool {
        let removed = self.lock().pop(&body).is_some();
        if removed {
            record_eviction();
        }
        removed
    }

    /// Drops every cached graph.
    pub fn clear(&self) {
        let mut entries = self.lock();
        for _ in 0..entries.len() {
            record_eviction();
        }
        entries.clear();
    }

    /// Unwraps the cache, returning the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<BodyId, CachedGraph>> {
        // Entries are replaced whole, so a poisoned guard still holds
        // consistent data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, body: BodyId, version: &StoreVersion) -> Option<RawBodyGraph> {
        let mut entries = self.lock();
        match entries.get(&body) {
            Some(cached) if cached.version == *version => return Some(cached.graph.clone()),
            Some(_) => {}
            None => return None,
        }
        entries.pop(&body);
        record_eviction();
        trace!(%body, "cached graph superseded by a new store version");
        None
    }

    fn store(&self, body: BodyId, version: &StoreVersion, graph: &RawBodyGraph) {
        let entry = CachedGraph {
            version: version.clone(),
            graph: graph.clone(),
        };
        if let Some((evicted, _)) = self.lock().push(body, entry)
            && evicted != body
        {
            record_eviction();
        }
    }
}

impl<S: GraphSource> GraphSource for CachedGraphSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[instrument(level = "trace", skip(self, version), fields(version = %version))]
    fn fetch_body_graph(
        &self,
        body: BodyId,
        version: &StoreVersion,
    ) -> Result<RawBodyGraph, GraphSourceError> {
        if let Some(graph) = self.lookup(body, version) {
            record_hit();
            return Ok(graph);
        }
        record_miss();
        let graph = self.inner.fetch_body_graph(body, version)?;
        self.store(body, version, &graph);
        Ok(graph)
    }
}

#[cfg(feature = "metrics")]
fn record_hit() {
    metrics::counter!("graph_cache_hits").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_hit() {}

#[cfg(feature = "metrics")]
fn record_miss() {
    metrics::counter!("graph_cache_misses").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_miss() {}

#[cfg(feature = "metrics")]
fn record_eviction() {
    metrics::counter!("graph_cache_evictions").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_eviction() {}
