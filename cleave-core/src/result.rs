//! Immutable cleave results and the assembler producing them.

use std::collections::BTreeMap;

use crate::{
    Result,
    error::CleaveError,
    graph::AdjacencyGraph,
    ids::{BodyId, GroupId, SeedLabel, SupervoxelId},
    partition::TraceEvent,
    reconcile::Reconciled,
    seeds::{SeedMap, group_id},
};

/// How an output group came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "snake_case"))]
pub enum GroupKind {
    /// The primary group of an operator seed label.
    Seeded,
    /// Seeds of a label that could not be joined to the label's primary group.
    Detached,
    /// A region with no defensible attachment to any seed.
    Unassigned,
}

impl GroupKind {
    /// Returns the stable name used in logs and rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Detached => "detached",
            Self::Unassigned => "unassigned",
        }
    }
}

/// Per-group facts reported alongside the partition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GroupSummary {
    id: GroupId,
    kind: GroupKind,
    label: Option<SeedLabel>,
    seeds: Vec<SupervoxelId>,
    size: usize,
    strongest_boundary: Option<f32>,
}

impl GroupSummary {
    /// Returns the group identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn id(&self) -> GroupId { self.id }

    /// Returns how the group was formed.
    #[must_use]
    #[rustfmt::skip]
    pub fn kind(&self) -> GroupKind { self.kind }

    /// Returns the operator label, absent for unassigned groups.
    #[must_use]
    #[rustfmt::skip]
    pub fn label(&self) -> Option<SeedLabel> { self.label }

    /// Returns the seed supervoxels inside the group in ascending order.
    #[must_use]
    #[rustfmt::skip]
    pub fn seeds(&self) -> &[SupervoxelId] { &self.seeds }

    /// Returns the number of supervoxels in the group.
    #[must_use]
    #[rustfmt::skip]
    pub fn size(&self) -> usize { self.size }

    /// Returns the weight of the strongest cut edge leaving the group.
    ///
    /// A low value means the group separated cleanly.
    #[must_use]
    #[rustfmt::skip]
    pub fn strongest_boundary(&self) -> Option<f32> { self.strongest_boundary }
}

/// An edge whose endpoints ended in different groups.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CutEdge {
    /// Smaller supervoxel.
    pub source: SupervoxelId,
    /// Larger supervoxel.
    pub target: SupervoxelId,
    /// Merge confidence that was overruled.
    pub weight: f32,
    /// Agglomeration rank, if known.
    pub rank: Option<u64>,
    /// Groups of `source` and `target`, in that order.
    pub groups: (GroupId, GroupId),
}

/// Final partition of one body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CleaveResult {
    body: BodyId,
    assignments: Vec<(SupervoxelId, GroupId)>,
    groups: Vec<GroupSummary>,
    cut_edges: Vec<CutEdge>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    trace: Option<Vec<TraceEvent>>,
}

impl CleaveResult {
    /// Returns the body that was cleaved.
    #[must_use]
    #[rustfmt::skip]
    pub fn body(&self) -> BodyId { self.body }

    /// Returns `(supervoxel, group)` for every supervoxel, by ascending id.
    #[must_use]
    #[rustfmt::skip]
    pub fn assignments(&self) -> &[(SupervoxelId, GroupId)] { &self.assignments }

    /// Returns the group of `supervoxel`, if it belongs to the body.
    #[must_use]
    pub fn group_of(&self, supervoxel: SupervoxelId) -> Option<GroupId> {
        self.assignments
            .binary_search_by_key(&supervoxel, |&(id, _)| id)
            .ok()
            .map(|position| self.assignments[position].1)
    }

    /// Returns the group summaries ordered by group id.
    #[must_use]
    #[rustfmt::skip]
    pub fn groups(&self) -> &[GroupSummary] { &self.groups }

    /// Returns the summary of `group`.
    #[must_use]
    pub fn group(&self, group: GroupId) -> Option<&GroupSummary> {
        self.groups.get(group.index())
    }

    /// Iterates over the supervoxels of `group` in ascending order.
    pub fn members(&self, group: GroupId) -> impl Iterator<Item = SupervoxelId> + '_ {
        self.assignments
            .iter()
            .filter(move |&&(_, assigned)| assigned == group)
            .map(|&(supervoxel, _)| supervoxel)
    }

    /// Returns the cut edges sorted by `(source, target)`.
    #[must_use]
    #[rustfmt::skip]
    pub fn cut_edges(&self) -> &[CutEdge] { &self.cut_edges }

    /// Returns the weight of the strongest cut edge.
    #[must_use]
    pub fn max_cut_weight(&self) -> Option<f32> {
        self.cut_edges
            .iter()
            .map(|edge| edge.weight)
            .max_by(f32::total_cmp)
    }

    /// Returns the agglomeration trace when it was recorded.
    #[must_use]
    pub fn trace(&self) -> Option<&[TraceEvent]> {
        self.trace.as_deref()
    }
}

/// Seeds of one label that ended up outside the label's primary group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnreachableSeeds {
    /// Operator label affected.
    pub label: SeedLabel,
    /// Seeds outside the primary group, ascending.
    pub seeds: Vec<SupervoxelId>,
    /// Detached groups holding those seeds.
    pub detached: Vec<GroupId>,
}

/// Outcome of a cleave.
///
/// A partially merged outcome still carries a valid connected partition; the
/// caller decides whether to accept it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "outcome", rename_all = "snake_case")
)]
pub enum CleaveOutcome {
    /// Every seed label occupies exactly one connected group.
    Separated(CleaveResult),
    /// Some labels could not keep all their seeds together.
    PartiallyMerged {
        /// Best-effort partition.
        result: CleaveResult,
        /// One entry per affected label.
        unreachable: Vec<UnreachableSeeds>,
    },
}

impl CleaveOutcome {
    /// Returns `true` when every label was separated cleanly.
    #[must_use]
    pub const fn is_separated(&self) -> bool {
        matches!(self, Self::Separated(_))
    }

    /// Borrows the partition regardless of the outcome.
    #[must_use]
    pub const fn result(&self) -> &CleaveResult {
        match self {
            Self::Separated(result) | Self::PartiallyMerged { result, .. } => result,
        }
    }

    /// Returns the partition regardless of the outcome.
    #[must_use]
    pub fn into_result(self) -> CleaveResult {
        match self {
            Self::Separated(result) | Self::PartiallyMerged { result, .. } => result,
        }
    }

    /// Returns the unreachable-seed warnings, empty when separated.
    #[must_use]
    pub fn unreachable(&self) -> &[UnreachableSeeds] {
        match self {
            Self::Separated(_) => &[],
            Self::PartiallyMerged { unreachable, .. } => unreachable,
        }
    }

    /// Returns the partition only if every label was separated cleanly.
    ///
    /// # Errors
    /// Returns [`CleaveError::SeedsUnreachableDistinct`] for the first
    /// affected label of a partially merged outcome.
    pub fn into_separated(self) -> Result<CleaveResult> {
        match self {
            Self::Separated(result) => Ok(result),
            Self::PartiallyMerged { unreachable, result } => {
                let Some(first) = unreachable.into_iter().next() else {
                    return Ok(result);
                };
                Err(CleaveError::SeedsUnreachableDistinct {
                    label: first.label,
                    seeds: first.seeds,
                })
            }
        }
    }
}

/// Builds the final outcome from a reconciled partition.
pub(crate) fn assemble(
    graph: &AdjacencyGraph,
    seeds: &SeedMap,
    reconciled: Reconciled,
    trace: Option<Vec<TraceEvent>>,
) -> CleaveOutcome {
    let Reconciled {
        group_of,
        groups,
        unreachable,
    } = reconciled;

    let mut sizes = vec![0_usize; groups.len()];
    for group in &group_of {
        sizes[group.index()] += 1;
    }

    let mut seeds_by_group: BTreeMap<GroupId, Vec<SupervoxelId>> = BTreeMap::new();
    for &(node, _) in seeds.seeds() {
        seeds_by_group
            .entry(group_of[node])
            .or_default()
            .push(graph.supervoxel(node));
    }

    let mut strongest: Vec<Option<f32>> = vec![None; groups.len()];
    let mut cut_edges = Vec::new();
    for edge in graph.edges() {
        let (left, right) = (group_of[edge.source()], group_of[edge.target()]);
        if left == right {
            continue;
        }
        for group in [left, right] {
            let slot = &mut strongest[group.index()];
            *slot = Some(slot.map_or(edge.weight(), |best| best.max(edge.weight())));
        }
        let (source, target) = graph.endpoints(edge);
        cut_edges.push(CutEdge {
            source,
            target,
            weight: edge.weight(),
            rank: edge.rank(),
            groups: (left, right),
        });
    }

    let groups = groups
        .into_iter()
        .enumerate()
        .map(|(index, plan)| {
            let id = group_id(index);
            GroupSummary {
                id,
                kind: plan.kind,
                label: plan.label,
                seeds: seeds_by_group.remove(&id).unwrap_or_default(),
                size: sizes[index],
                strongest_boundary: strongest[index],
            }
        })
        .collect();

    let assignments = group_of
        .iter()
        .enumerate()
        .map(|(node, &group)| (graph.supervoxel(node), group))
        .collect();

    let result = CleaveResult {
        body: graph.body(),
        assignments,
        groups,
        cut_edges,
        trace,
    };
    if unreachable.is_empty() {
        CleaveOutcome::Separated(result)
    } else {
        CleaveOutcome::PartiallyMerged {
            result,
            unreachable,
        }
    }
}
