//! Seed-constrained agglomeration of the body graph.
//!
//! Both strategies grow components with a union-find, most confident evidence
//! first, and refuse any merge that would join two different seed groups.
//! What differs is how confidence is measured:
//!
//! - [`PartitionStrategy::SeededAgglomeration`] visits individual edges in a
//!   single sorted pass (a seed-constrained Kruskal). Every refused edge is a
//!   candidate cut edge, and refused edges are always the least confident
//!   ones available when the separation had to be enforced.
//! - [`PartitionStrategy::MeanAffinity`] repeatedly merges the pair of
//!   adjacent components whose connecting edges have the highest mean weight,
//!   re-averaging after every merge.
//!
//! Components that never meet a seed are left unlabelled; the reconciler
//! decides what happens to them.
//!
//! Edge order is a total order, so results never depend on sort stability or
//! thread count: weight descending, then agglomeration rank ascending (edges
//! without a rank after ranked ones), then the endpoint pair ascending.

mod mean_affinity;
mod seeded;
mod union_find;

use std::{cmp::Ordering, fmt, num::NonZeroUsize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    Result,
    cancel::CancellationToken,
    graph::{AdjacencyGraph, GraphEdge},
    ids::{GroupId, SupervoxelId},
    seeds::SeedMap,
};

use self::{mean_affinity::MeanAffinity, seeded::SeededAgglomeration};

/// Default number of merge steps between cancellation polls.
pub(crate) const CANCEL_POLL_INTERVAL: NonZeroUsize = NonZeroUsize::MIN.saturating_add(4095);

/// Selects the partitioning algorithm used by [`crate::Cleaver`].
///
/// # Examples
/// ```
/// use cleave_core::PartitionStrategy;
///
/// assert_eq!(PartitionStrategy::default(), PartitionStrategy::SeededAgglomeration);
/// assert_eq!(PartitionStrategy::MeanAffinity.as_str(), "mean-affinity");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "kebab-case"))]
pub enum PartitionStrategy {
    /// Single pass over individually sorted edges.
    #[default]
    SeededAgglomeration,
    /// Merge components by highest mean connecting-edge weight.
    MeanAffinity,
}

impl PartitionStrategy {
    /// Returns the stable name used in logs and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SeededAgglomeration => "seeded",
            Self::MeanAffinity => "mean-affinity",
        }
    }

    fn partitioner(self) -> &'static dyn Partitioner {
        match self {
            Self::SeededAgglomeration => &SeededAgglomeration,
            Self::MeanAffinity => &MeanAffinity,
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the agglomeration, kept when tracing is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "event", rename_all = "snake_case")
)]
pub enum TraceEvent {
    /// Two components were merged along this evidence.
    Merged {
        /// Smaller supervoxel of the representative edge.
        source: SupervoxelId,
        /// Larger supervoxel of the representative edge.
        target: SupervoxelId,
        /// Confidence the merge was decided on.
        weight: f32,
    },
    /// The merge was refused because both sides carry different seeds.
    Blocked {
        /// Smaller supervoxel of the representative edge.
        source: SupervoxelId,
        /// Larger supervoxel of the representative edge.
        target: SupervoxelId,
        /// Confidence of the refused evidence.
        weight: f32,
    },
}

impl TraceEvent {
    /// Returns the confidence this step was decided on.
    #[must_use]
    pub const fn weight(&self) -> f32 {
        match self {
            Self::Merged { weight, .. } | Self::Blocked { weight, .. } => *weight,
        }
    }
}

/// Knobs shared by every partitioner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PartitionSettings {
    pub(crate) min_merge_weight: f32,
    pub(crate) record_trace: bool,
    /// Merge steps between cancellation polls during the union pass.
    pub(crate) cancel_poll_interval: NonZeroUsize,
}

/// Union-find outcome before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawPartition {
    /// Root node of every node's component.
    pub(crate) component_of: Vec<usize>,
    /// Seed group per node; only meaningful at roots.
    pub(crate) labels: Vec<Option<GroupId>>,
    pub(crate) trace: Option<Vec<TraceEvent>>,
}

impl RawPartition {
    /// Returns the seed group of `node`'s component.
    pub(crate) fn label_of(&self, node: usize) -> Option<GroupId> {
        self.component_of
            .get(node)
            .and_then(|&root| self.labels.get(root).copied().flatten())
    }
}

/// Contract every partitioning algorithm fulfils.
pub(crate) trait Partitioner: Sync {
    fn partition(
        &self,
        graph: &AdjacencyGraph,
        seeds: &SeedMap,
        settings: PartitionSettings,
        cancel: &CancellationToken,
    ) -> Result<RawPartition>;
}

/// Runs `strategy` over `graph`.
#[instrument(
    name = "cleave.partition",
    err,
    skip(graph, seeds, settings, cancel),
    fields(
        body = %graph.body(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        groups = seeds.group_count(),
        strategy = %strategy,
    ),
)]
pub(crate) fn partition(
    strategy: PartitionStrategy,
    graph: &AdjacencyGraph,
    seeds: &SeedMap,
    settings: PartitionSettings,
    cancel: &CancellationToken,
) -> Result<RawPartition> {
    let raw = strategy
        .partitioner()
        .partition(graph, seeds, settings, cancel)?;
    debug!(
        unlabelled = (0..graph.node_count())
            .filter(|&node| raw.label_of(node).is_none())
            .count(),
        "agglomeration finished"
    );
    Ok(raw)
}

/// Total order in which evidence is considered: most confident first.
pub(crate) fn merge_order(left: &GraphEdge, right: &GraphEdge) -> Ordering {
    right
        .weight()
        .total_cmp(&left.weight())
        .then_with(|| compare_ranks(left.rank(), right.rank()))
        .then_with(|| left.source().cmp(&right.source()))
        .then_with(|| left.target().cmp(&right.target()))
}

/// Earlier agglomeration ranks come first; unranked evidence comes last.
pub(crate) fn compare_ranks(left: Option<u64>, right: Option<u64>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns edge indices of `graph` sorted by [`merge_order`].
pub(crate) fn sorted_edge_indices(graph: &AdjacencyGraph) -> Vec<usize> {
    let edges = graph.edges();
    let mut order: Vec<usize> = (0..edges.len()).collect();
    let compare = |a: &usize, b: &usize| merge_order(&edges[*a], &edges[*b]);
    #[cfg(feature = "parallel")]
    order.par_sort_unstable_by(compare);
    #[cfg(not(feature = "parallel"))]
    order.sort_unstable_by(compare);
    order
}

fn trace_event(graph: &AdjacencyGraph, edge: &GraphEdge, merged: bool) -> TraceEvent {
    let (source, target) = graph.endpoints(edge);
    let weight = edge.weight();
    if merged {
        TraceEvent::Merged {
            source,
            target,
            weight,
        }
    } else {
        TraceEvent::Blocked {
            source,
            target,
            weight,
        }
    }
}
