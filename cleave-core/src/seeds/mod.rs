//! Validation and normalisation of operator seeds.
//!
//! Operators label a handful of supervoxels with arbitrary integers. The
//! resolver checks those supervoxels against the body graph, folds every
//! supervoxel sharing a label into one seed group and renumbers the groups
//! densely in ascending label order.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::{
    Result,
    error::CleaveError,
    graph::AdjacencyGraph,
    ids::{GroupId, SeedLabel, SupervoxelId},
};

/// Seed labels exactly as the operator supplied them.
///
/// Pairs are kept in input order so a supervoxel given two labels can be
/// reported against the label it received first.
///
/// # Examples
/// ```
/// use cleave_core::{SeedAssignments, SeedLabel, SupervoxelId};
///
/// let seeds = SeedAssignments::from_groups([
///     (SeedLabel::new(1), vec![SupervoxelId::new(10), SupervoxelId::new(11)]),
///     (SeedLabel::new(2), vec![SupervoxelId::new(20)]),
/// ]);
/// assert_eq!(seeds.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedAssignments {
    pairs: Vec<(SupervoxelId, SeedLabel)>,
}

impl SeedAssignments {
    /// Creates assignments from `(supervoxel, label)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (SupervoxelId, SeedLabel)>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Creates assignments from `label -> supervoxels` groups.
    pub fn from_groups<I>(groups: impl IntoIterator<Item = (SeedLabel, I)>) -> Self
    where
        I: IntoIterator<Item = SupervoxelId>,
    {
        let pairs = groups
            .into_iter()
            .flat_map(|(label, supervoxels)| {
                supervoxels.into_iter().map(move |supervoxel| (supervoxel, label))
            })
            .collect();
        Self { pairs }
    }

    /// Adds a single assignment.
    pub fn push(&mut self, supervoxel: SupervoxelId, label: SeedLabel) {
        self.pairs.push((supervoxel, label));
    }

    /// Returns the number of pairs, repeats included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` when no seed was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the pairs in input order.
    #[must_use]
    pub fn pairs(&self) -> &[(SupervoxelId, SeedLabel)] {
        &self.pairs
    }
}

impl FromIterator<(SupervoxelId, SeedLabel)> for SeedAssignments {
    fn from_iter<T: IntoIterator<Item = (SupervoxelId, SeedLabel)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// Validated seeds keyed by node index, with dense group identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMap {
    labels: Vec<SeedLabel>,
    seeds: Vec<(usize, GroupId)>,
}

impl SeedMap {
    /// Validates `assignments` against `graph`.
    ///
    /// # Errors
    /// Returns [`CleaveError::ConflictingSeed`] when a supervoxel carries two
    /// labels, [`CleaveError::UnknownSeed`] listing every seed outside the
    /// body, and [`CleaveError::InsufficientSeeds`] when fewer than two
    /// distinct labels remain.
    ///
    /// # Examples
    /// ```
    /// use cleave_core::{
    ///     BodyId, GraphBuilder, RawBodyGraph, RawEdge, SeedAssignments, SeedLabel, SeedMap,
    ///     SupervoxelId,
    /// };
    ///
    /// let sv = SupervoxelId::new;
    /// let raw = RawBodyGraph::from_edges(BodyId::new(1), vec![RawEdge::new(sv(1), sv(2), 1.0)]);
    /// let graph = GraphBuilder::default().build(&raw)?;
    /// let seeds = SeedAssignments::from_pairs([(sv(2), SeedLabel::new(40)), (sv(1), SeedLabel::new(7))]);
    /// let map = SeedMap::resolve(&graph, &seeds)?;
    /// assert_eq!(map.group_count(), 2);
    /// assert_eq!(map.label(cleave_core::GroupId::new(0)), Some(SeedLabel::new(7)));
    /// # Ok::<(), cleave_core::CleaveError>(())
    /// ```
    #[instrument(
        name = "cleave.resolve_seeds",
        err,
        skip(graph, assignments),
        fields(body = %graph.body(), pairs = assignments.len()),
    )]
    pub fn resolve(graph: &AdjacencyGraph, assignments: &SeedAssignments) -> Result<Self> {
        let mut by_supervoxel: BTreeMap<SupervoxelId, SeedLabel> = BTreeMap::new();
        for &(supervoxel, label) in assignments.pairs() {
            match by_supervoxel.get(&supervoxel) {
                Some(&first) if first != label => {
                    return Err(CleaveError::ConflictingSeed {
                        supervoxel,
                        first,
                        second: label,
                    });
                }
                Some(_) => {}
                None => {
                    by_supervoxel.insert(supervoxel, label);
                }
            }
        }

        let unknown: Vec<SupervoxelId> = by_supervoxel
            .keys()
            .copied()
            .filter(|supervoxel| !graph.contains(*supervoxel))
            .collect();
        if !unknown.is_empty() {
            return Err(CleaveError::UnknownSeed {
                supervoxels: unknown,
            });
        }

        let labels: Vec<SeedLabel> = by_supervoxel
            .values()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if labels.len() < 2 {
            return Err(CleaveError::InsufficientSeeds {
                groups: labels.len(),
            });
        }

        let mut seeds = Vec::with_capacity(by_supervoxel.len());
        for (supervoxel, label) in by_supervoxel {
            let (Some(node), Ok(group)) = (graph.index_of(supervoxel), labels.binary_search(&label))
            else {
                continue;
            };
            seeds.push((node, group_id(group)));
        }
        seeds.sort_unstable();

        debug!(groups = labels.len(), seeds = seeds.len(), "seeds resolved");
        Ok(Self { labels, seeds })
    }

    /// Returns the number of seed groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.labels.len()
    }

    /// Returns the operator label of `group`.
    #[must_use]
    pub fn label(&self, group: GroupId) -> Option<SeedLabel> {
        self.labels.get(group.index()).copied()
    }

    /// Returns the labels in group order.
    #[must_use]
    pub fn labels(&self) -> &[SeedLabel] {
        &self.labels
    }

    /// Returns `(node, group)` pairs sorted by node index.
    #[must_use]
    pub fn seeds(&self) -> &[(usize, GroupId)] {
        &self.seeds
    }

    /// Returns the seed group of `node`, if it is a seed.
    #[must_use]
    pub fn group_of(&self, node: usize) -> Option<GroupId> {
        self.seeds
            .binary_search_by_key(&node, |&(seed, _)| seed)
            .ok()
            .map(|position| self.seeds[position].1)
    }

    /// Expands the seeds into a per-node label vector.
    pub(crate) fn node_labels(&self, node_count: usize) -> Vec<Option<GroupId>> {
        let mut labels = vec![None; node_count];
        for &(node, group) in &self.seeds {
            if let Some(slot) = labels.get_mut(node) {
                *slot = Some(group);
            }
        }
        labels
    }
}

pub(crate) fn group_id(index: usize) -> GroupId {
    GroupId::new(u32::try_from(index).unwrap_or(u32::MAX))
}
