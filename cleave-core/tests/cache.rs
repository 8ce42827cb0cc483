//! Tests for the LRU body-graph cache.
#![cfg(feature = "cache")]

mod common;

use std::num::NonZeroUsize;

use cleave_core::{
    BodyId, CachedGraphSource, CancellationToken, CleaveError, CleaverBuilder, GraphCacheConfig,
    GraphSource, StoreVersion,
};
use common::{InMemorySource, VERSION, path, seeds, two_triangles};
use rstest::{fixture, rstest};

#[fixture]
fn cache() -> CachedGraphSource<InMemorySource> {
    let capacity = NonZeroUsize::new(2).expect("non-zero capacity");
    CachedGraphSource::new(
        InMemorySource::new([
            two_triangles(BodyId::new(1)),
            path(BodyId::new(2)),
            path(BodyId::new(3)),
        ]),
        GraphCacheConfig::default().with_max_bodies(capacity),
    )
}

fn version() -> StoreVersion {
    StoreVersion::new(VERSION)
}

#[rstest]
fn repeated_fetches_hit_the_cache(cache: CachedGraphSource<InMemorySource>) {
    let first = cache
        .fetch_body_graph(BodyId::new(1), &version())
        .expect("fetch must succeed");
    let second = cache
        .fetch_body_graph(BodyId::new(1), &version())
        .expect("fetch must succeed");
    assert_eq!(first, second);
    assert_eq!(cache.inner().fetches(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.name(), "in-memory");
}

#[rstest]
fn new_versions_bypass_stale_entries(cache: CachedGraphSource<InMemorySource>) {
    cache
        .fetch_body_graph(BodyId::new(1), &version())
        .expect("fetch must succeed");
    let err = cache
        .fetch_body_graph(BodyId::new(1), &StoreVersion::new("v2"))
        .expect_err("the in-memory store only serves v1");
    assert_eq!(err.code().as_str(), "GRAPH_SOURCE_UNKNOWN_BODY");
    assert_eq!(cache.inner().fetches(), 2);
    assert!(cache.is_empty());
}

#[rstest]
fn failures_are_not_cached(cache: CachedGraphSource<InMemorySource>) {
    for _ in 0..2 {
        cache
            .fetch_body_graph(BodyId::new(42), &version())
            .expect_err("unknown body");
    }
    assert_eq!(cache.inner().fetches(), 2);
    assert!(cache.is_empty());
}

#[rstest]
fn least_recently_used_bodies_are_evicted(cache: CachedGraphSource<InMemorySource>) {
    let v = version();
    for body in [1, 2, 1, 3] {
        cache
            .fetch_body_graph(BodyId::new(body), &v)
            .expect("fetch must succeed");
    }
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.inner().fetches(), 3);

    cache.fetch_body_graph(BodyId::new(1), &v).expect("cached");
    assert_eq!(cache.inner().fetches(), 3);
    cache.fetch_body_graph(BodyId::new(2), &v).expect("refetched");
    assert_eq!(cache.inner().fetches(), 4);
}

#[rstest]
fn invalidation_and_clear_drop_entries(cache: CachedGraphSource<InMemorySource>) {
    let v = version();
    cache.fetch_body_graph(BodyId::new(1), &v).expect("fetch");
    cache.fetch_body_graph(BodyId::new(2), &v).expect("fetch");

    assert!(cache.invalidate(BodyId::new(1)));
    assert!(!cache.invalidate(BodyId::new(1)));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    cache.fetch_body_graph(BodyId::new(2), &v).expect("fetch");
    assert_eq!(cache.inner().fetches(), 3);
}

#[rstest]
fn cleaver_reuses_cached_graphs(cache: CachedGraphSource<InMemorySource>) {
    let cleaver = CleaverBuilder::new().build().expect("defaults are valid");
    let cancel = CancellationToken::new();
    let request = seeds(&[(1, 10), (6, 20)]);
    let first = cleaver
        .cleave(&cache, BodyId::new(1), &version(), &request, &cancel)
        .expect("cleave must succeed");
    let second = cleaver
        .cleave(&cache, BodyId::new(1), &version(), &request, &cancel)
        .expect("cleave must succeed");
    assert_eq!(first, second);
    assert_eq!(cache.inner().fetches(), 1);

    let unavailable = CachedGraphSource::new(InMemorySource::unavailable(), cache.config());
    let err = cleaver
        .cleave(&unavailable, BodyId::new(1), &version(), &request, &cancel)
        .expect_err("store is down");
    assert!(matches!(err, CleaveError::GraphSource { .. }));
    assert!(err.is_retryable());
}
