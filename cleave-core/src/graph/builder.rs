//! Conversion of raw store data into an [`AdjacencyGraph`].

use std::cmp::Reverse;

use tracing::{debug, instrument, warn};

use crate::{Result, error::CleaveError, ids::SupervoxelId};

use super::{AdjacencyGraph, GraphEdge, RawBodyGraph};

/// Builds body-scoped adjacency graphs.
///
/// Edges are canonicalised, self-loops dropped and repeated pairs collapsed
/// with the last occurrence winning. Edges with one endpoint outside the body
/// are boundary edges and are dropped silently. Edges with no endpoint in the
/// body are foreign; when they make up more than the configured fraction of
/// the input the body membership is considered stale.
///
/// # Examples
/// ```
/// use cleave_core::{BodyId, GraphBuilder, RawBodyGraph, RawEdge, SupervoxelId};
///
/// let sv = SupervoxelId::new;
/// let raw = RawBodyGraph::from_edges(
///     BodyId::new(1),
///     vec![RawEdge::new(sv(2), sv(1), 0.5), RawEdge::new(sv(1), sv(2), 0.8)],
/// );
/// let graph = GraphBuilder::default().build(&raw)?;
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.edges()[0].weight(), 0.8);
/// # Ok::<(), cleave_core::CleaveError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphBuilder {
    foreign_edge_tolerance: f32,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            foreign_edge_tolerance: Self::DEFAULT_FOREIGN_EDGE_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    source: usize,
    target: usize,
    weight: f32,
    rank: Option<u64>,
    position: usize,
}

impl GraphBuilder {
    /// Fraction of foreign edges tolerated when none is configured.
    pub const DEFAULT_FOREIGN_EDGE_TOLERANCE: f32 = 0.01;

    /// Creates a builder tolerating at most `tolerance` foreign edges, as a
    /// fraction of all supplied edges.
    ///
    /// # Errors
    /// Returns [`CleaveError::InvalidConfiguration`] unless
    /// `0.0 <= tolerance <= 1.0`.
    pub fn new(tolerance: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&tolerance) {
            return Err(CleaveError::InvalidConfiguration {
                parameter: "foreign_edge_tolerance",
                reason: "must be a fraction between 0 and 1",
            });
        }
        Ok(Self {
            foreign_edge_tolerance: tolerance,
        })
    }

    /// Returns the configured foreign-edge tolerance.
    #[must_use]
    #[rustfmt::skip]
    pub fn foreign_edge_tolerance(&self) -> f32 { self.foreign_edge_tolerance }

    /// Builds the adjacency graph for `raw`.
    ///
    /// # Errors
    /// Returns [`CleaveError::EmptyBody`] when no supervoxel remains,
    /// [`CleaveError::InconsistentGraph`] when foreign edges exceed the
    /// tolerance, and [`CleaveError::InvalidEdgeWeight`] when a retained edge
    /// has a negative or non-finite weight.
    #[instrument(
        name = "cleave.build_graph",
        err,
        skip(self, raw),
        fields(body = %raw.body(), raw_edges = raw.edges().len()),
    )]
    pub fn build(&self, raw: &RawBodyGraph) -> Result<AdjacencyGraph> {
        let nodes = collect_nodes(raw);
        if nodes.is_empty() {
            return Err(CleaveError::EmptyBody { body: raw.body() });
        }

        let mut candidates = Vec::with_capacity(raw.edges().len());
        let mut boundary = 0_usize;
        let mut self_loops = 0_usize;
        let mut foreign = 0_usize;
        let mut example = None;

        for (position, edge) in raw.edges().iter().enumerate() {
            let (low, high) = if edge.u <= edge.v {
                (edge.u, edge.v)
            } else {
                (edge.v, edge.u)
            };
            match (nodes.binary_search(&low), nodes.binary_search(&high)) {
                (Ok(_), Ok(_)) if low == high => self_loops += 1,
                (Ok(source), Ok(target)) => candidates.push(Candidate {
                    source,
                    target,
                    weight: edge.weight,
                    rank: edge.rank,
                    position,
                }),
                (Err(_), Err(_)) => {
                    foreign += 1;
                    example.get_or_insert((low, high));
                }
                _ => boundary += 1,
            }
        }

        self.check_foreign_edges(raw, foreign, example)?;

        candidates.sort_unstable_by_key(|c| (c.source, c.target, Reverse(c.position)));
        candidates.dedup_by_key(|c| (c.source, c.target));

        let mut edges = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !candidate.weight.is_finite() || candidate.weight < 0.0 {
                return Err(CleaveError::InvalidEdgeWeight {
                    source_id: nodes[candidate.source],
                    target_id: nodes[candidate.target],
                    weight: candidate.weight,
                });
            }
            edges.push(GraphEdge {
                source: candidate.source,
                target: candidate.target,
                weight: candidate.weight,
                rank: candidate.rank,
            });
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            boundary,
            self_loops,
            foreign,
            "adjacency graph built"
        );
        Ok(AdjacencyGraph::new(raw.body(), nodes, edges))
    }

    fn check_foreign_edges(
        &self,
        raw: &RawBodyGraph,
        foreign: usize,
        example: Option<(SupervoxelId, SupervoxelId)>,
    ) -> Result<()> {
        let Some(example) = example else {
            return Ok(());
        };
        let total = raw.edges().len();
        let fraction = foreign as f64 / total as f64;
        if fraction > f64::from(self.foreign_edge_tolerance) {
            return Err(CleaveError::InconsistentGraph {
                body: raw.body(),
                foreign_edges: foreign,
                total_edges: total,
                example,
            });
        }
        warn!(
            body = %raw.body(),
            foreign,
            total,
            "dropping edges outside the body within tolerance"
        );
        Ok(())
    }
}

fn collect_nodes(raw: &RawBodyGraph) -> Vec<SupervoxelId> {
    let mut nodes: Vec<SupervoxelId> = match raw.supervoxels() {
        Some(supervoxels) => supervoxels.to_vec(),
        None => raw.edges().iter().flat_map(|edge| [edge.u, edge.v]).collect(),
    };
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}
