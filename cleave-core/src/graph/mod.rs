//! Per-body supervoxel adjacency graph.
//!
//! The store hands over a raw supervoxel list and merge-evidence edges
//! ([`RawBodyGraph`]); [`GraphBuilder`] turns them into an immutable
//! [`AdjacencyGraph`] scoped to one body. Nodes are addressed by dense indices
//! assigned in ascending supervoxel order, so index order and identifier
//! order agree everywhere downstream.

mod builder;

use crate::ids::{BodyId, SupervoxelId};

pub use self::builder::GraphBuilder;

/// A merge-evidence edge as supplied by the store.
///
/// # Examples
/// ```
/// use cleave_core::{RawEdge, SupervoxelId};
///
/// let edge = RawEdge::new(SupervoxelId::new(7), SupervoxelId::new(3), 0.9).with_rank(12);
/// assert_eq!(edge.rank, Some(12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEdge {
    /// One endpoint.
    pub u: SupervoxelId,
    /// The other endpoint.
    pub v: SupervoxelId,
    /// Merge confidence; higher means more confidently merged.
    pub weight: f32,
    /// Position in the original agglomeration order; lower merged earlier.
    pub rank: Option<u64>,
}

impl RawEdge {
    /// Creates an edge without an agglomeration rank.
    #[must_use]
    pub const fn new(u: SupervoxelId, v: SupervoxelId, weight: f32) -> Self {
        Self {
            u,
            v,
            weight,
            rank: None,
        }
    }

    /// Attaches an agglomeration rank.
    #[must_use]
    pub const fn with_rank(mut self, rank: u64) -> Self {
        self.rank = Some(rank);
        self
    }
}

/// Body graph data exactly as fetched from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBodyGraph {
    body: BodyId,
    supervoxels: Option<Vec<SupervoxelId>>,
    edges: Vec<RawEdge>,
}

impl RawBodyGraph {
    /// Creates a body graph with an explicit supervoxel list.
    ///
    /// Supervoxels no edge mentions are kept as isolated nodes.
    #[must_use]
    pub fn new(body: BodyId, supervoxels: Vec<SupervoxelId>, edges: Vec<RawEdge>) -> Self {
        Self {
            body,
            supervoxels: Some(supervoxels),
            edges,
        }
    }

    /// Creates a body graph whose supervoxel set is the set of edge endpoints.
    #[must_use]
    pub fn from_edges(body: BodyId, edges: Vec<RawEdge>) -> Self {
        Self {
            body,
            supervoxels: None,
            edges,
        }
    }

    /// Returns the body identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn body(&self) -> BodyId { self.body }

    /// Returns the explicit supervoxel list, if one was supplied.
    #[must_use]
    pub fn supervoxels(&self) -> Option<&[SupervoxelId]> {
        self.supervoxels.as_deref()
    }

    /// Returns the raw edges in store order.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[RawEdge] { &self.edges }
}

/// An edge of the [`AdjacencyGraph`] in canonical form (`source < target`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    source: usize,
    target: usize,
    weight: f32,
    rank: Option<u64>,
}

impl GraphEdge {
    /// Returns the smaller endpoint's node index.
    #[must_use]
    #[rustfmt::skip]
    pub fn source(&self) -> usize { self.source }

    /// Returns the larger endpoint's node index.
    #[must_use]
    #[rustfmt::skip]
    pub fn target(&self) -> usize { self.target }

    /// Returns the merge confidence.
    #[must_use]
    #[rustfmt::skip]
    pub fn weight(&self) -> f32 { self.weight }

    /// Returns the agglomeration rank, if the store supplied one.
    #[must_use]
    #[rustfmt::skip]
    pub fn rank(&self) -> Option<u64> { self.rank }

    /// Returns the endpoint opposite `node`.
    #[must_use]
    pub fn opposite(&self, node: usize) -> usize {
        if node == self.source {
            self.target
        } else {
            self.source
        }
    }
}

/// Weighted undirected supervoxel graph of one body.
///
/// Built fresh for every request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyGraph {
    body: BodyId,
    nodes: Vec<SupervoxelId>,
    edges: Vec<GraphEdge>,
    offsets: Vec<usize>,
    incident: Vec<usize>,
}

impl AdjacencyGraph {
    fn new(body: BodyId, nodes: Vec<SupervoxelId>, edges: Vec<GraphEdge>) -> Self {
        let mut degree = vec![0_usize; nodes.len()];
        for edge in &edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }
        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        offsets.push(0);
        for count in &degree {
            let last = offsets.last().copied().unwrap_or(0);
            offsets.push(last + count);
        }
        let mut cursor = offsets.clone();
        let mut incident = vec![0_usize; edges.len() * 2];
        for (index, edge) in edges.iter().enumerate() {
            for endpoint in [edge.source, edge.target] {
                incident[cursor[endpoint]] = index;
                cursor[endpoint] += 1;
            }
        }
        Self {
            body,
            nodes,
            edges,
            offsets,
            incident,
        }
    }

    /// Returns the body this graph describes.
    #[must_use]
    #[rustfmt::skip]
    pub fn body(&self) -> BodyId { self.body }

    /// Returns the number of supervoxels.
    #[must_use]
    #[rustfmt::skip]
    pub fn node_count(&self) -> usize { self.nodes.len() }

    /// Returns the number of distinct edges.
    #[must_use]
    #[rustfmt::skip]
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Returns every supervoxel in ascending order; position is the node index.
    #[must_use]
    #[rustfmt::skip]
    pub fn supervoxels(&self) -> &[SupervoxelId] { &self.nodes }

    /// Returns the edges sorted by `(source, target)`.
    #[must_use]
    #[rustfmt::skip]
    pub fn edges(&self) -> &[GraphEdge] { &self.edges }

    /// Returns the supervoxel at `node`.
    ///
    /// # Panics
    /// Panics when `node` is not a valid node index.
    #[must_use]
    pub fn supervoxel(&self, node: usize) -> SupervoxelId {
        self.nodes[node]
    }

    /// Looks up the node index of `supervoxel`.
    #[must_use]
    pub fn index_of(&self, supervoxel: SupervoxelId) -> Option<usize> {
        self.nodes.binary_search(&supervoxel).ok()
    }

    /// Returns `true` when `supervoxel` belongs to the body.
    #[must_use]
    pub fn contains(&self, supervoxel: SupervoxelId) -> bool {
        self.index_of(supervoxel).is_some()
    }

    /// Returns the indices of the edges touching `node`.
    #[must_use]
    pub fn incident_edges(&self, node: usize) -> &[usize] {
        match (self.offsets.get(node), self.offsets.get(node + 1)) {
            (Some(&start), Some(&end)) => &self.incident[start..end],
            _ => &[],
        }
    }

    /// Iterates over `(neighbour, edge)` pairs adjacent to `node`.
    pub fn neighbours(&self, node: usize) -> impl Iterator<Item = (usize, &GraphEdge)> + '_ {
        self.incident_edges(node).iter().map(move |&index| {
            let edge = &self.edges[index];
            (edge.opposite(node), edge)
        })
    }

    /// Returns the supervoxel pair of `edge` as `(smaller, larger)`.
    #[must_use]
    pub fn endpoints(&self, edge: &GraphEdge) -> (SupervoxelId, SupervoxelId) {
        (self.nodes[edge.source], self.nodes[edge.target])
    }
}
