//! Shared fixtures for the integration tests.
#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use cleave_core::{
    BodyId, GraphSource, GraphSourceError, RawBodyGraph, RawEdge, SeedAssignments, SeedLabel,
    StoreVersion, SupervoxelId,
};

pub const VERSION: &str = "v1";

pub fn sv(id: u64) -> SupervoxelId {
    SupervoxelId::new(id)
}

pub fn edge(u: u64, v: u64, weight: f32) -> RawEdge {
    RawEdge::new(sv(u), sv(v), weight)
}

pub fn seeds(pairs: &[(u64, u64)]) -> SeedAssignments {
    pairs
        .iter()
        .map(|&(supervoxel, label)| (sv(supervoxel), SeedLabel::new(label)))
        .collect()
}

/// Two triangles `{1, 2, 3}` and `{4, 5, 6}` joined by a weak 3-4 bridge.
pub fn two_triangles(body: BodyId) -> RawBodyGraph {
    RawBodyGraph::from_edges(
        body,
        vec![
            edge(1, 2, 0.9),
            edge(2, 3, 0.85),
            edge(1, 3, 0.8),
            edge(4, 5, 0.9),
            edge(5, 6, 0.85),
            edge(4, 6, 0.8),
            edge(3, 4, 0.1),
        ],
    )
}

/// A path `1-2-3-4-5` with weights decreasing along it.
pub fn path(body: BodyId) -> RawBodyGraph {
    RawBodyGraph::from_edges(
        body,
        vec![
            edge(1, 2, 0.9),
            edge(2, 3, 0.8),
            edge(3, 4, 0.7),
            edge(4, 5, 0.6),
        ],
    )
}

/// In-memory store serving one version and counting fetches.
#[derive(Debug, Default)]
pub struct InMemorySource {
    bodies: BTreeMap<BodyId, RawBodyGraph>,
    unavailable: bool,
    fetches: AtomicUsize,
}

impl InMemorySource {
    pub fn new(graphs: impl IntoIterator<Item = RawBodyGraph>) -> Self {
        Self {
            bodies: graphs.into_iter().map(|graph| (graph.body(), graph)).collect(),
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl GraphSource for InMemorySource {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn fetch_body_graph(
        &self,
        body: BodyId,
        version: &StoreVersion,
    ) -> Result<RawBodyGraph, GraphSourceError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if self.unavailable {
            return Err(GraphSourceError::StoreUnavailable {
                reason: "connection refused".into(),
            });
        }
        if version.as_str() != VERSION {
            return Err(GraphSourceError::UnknownBody { body });
        }
        self.bodies
            .get(&body)
            .cloned()
            .ok_or(GraphSourceError::UnknownBody { body })
    }
}
