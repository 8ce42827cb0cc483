//! Turns the raw union-find partition into connected output groups.
//!
//! Every union-find component is connected because unions only ever follow
//! edges, so the reconciler works on whole components ("fragments"):
//!
//! 1. A seed label held by several fragments keeps only its largest fragment
//!    (ties: smallest supervoxel) as the primary group. The other seeded
//!    fragments become detached groups and are reported as unreachable seeds.
//! 2. Unlabelled fragments are attached, strongest connecting edge first, to
//!    whichever adjacent group reaches them. Attachment spreads through
//!    fragments attached earlier, so chains of orphans follow their strongest
//!    route to a seed. An orphan may therefore join a group it only touches
//!    through another orphan, even when it has a weaker direct edge to a
//!    different labelled component; the weaker edge is the one that is cut.
//! 3. Fragments no group can reach become unassigned groups.
//!
//! Group ids are dense: seeded groups first in label order, then detached
//! groups by label and smallest supervoxel, then unassigned groups by
//! smallest supervoxel.

use std::{cmp::Ordering, collections::BinaryHeap};

use tracing::{debug, instrument, warn};

use crate::{
    graph::{AdjacencyGraph, GraphEdge},
    ids::{GroupId, SeedLabel},
    partition::{RawPartition, merge_order},
    result::{GroupKind, UnreachableSeeds},
    seeds::{SeedMap, group_id},
};

/// Kind and label of one output group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GroupPlan {
    pub(crate) kind: GroupKind,
    pub(crate) label: Option<SeedLabel>,
}

/// Connected partition ready for assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Reconciled {
    /// Final group of every node.
    pub(crate) group_of: Vec<GroupId>,
    /// Output groups indexed by group id.
    pub(crate) groups: Vec<GroupPlan>,
    pub(crate) unreachable: Vec<UnreachableSeeds>,
}

#[derive(Debug, Clone)]
struct Fragment {
    label: Option<GroupId>,
    /// Member nodes in ascending order.
    nodes: Vec<usize>,
    group: Option<usize>,
}

/// Candidate attachment of an orphan fragment along one edge.
#[derive(Debug, Clone, Copy)]
struct Attachment<'g> {
    edge: &'g GraphEdge,
    fragment: usize,
    group: usize,
}

impl Ord for Attachment<'_> {
    // Greatest is attached first.
    fn cmp(&self, other: &Self) -> Ordering {
        merge_order(other.edge, self.edge).then_with(|| other.group.cmp(&self.group))
    }
}

impl PartialOrd for Attachment<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Attachment<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Attachment<'_> {}

/// Reconciles `raw` into connected groups.
#[instrument(
    name = "cleave.reconcile",
    skip(graph, seeds, raw),
    fields(body = %graph.body(), nodes = graph.node_count()),
)]
pub(crate) fn reconcile(graph: &AdjacencyGraph, seeds: &SeedMap, raw: &RawPartition) -> Reconciled {
    let (fragment_of, mut fragments) = collect_fragments(raw);
    let (mut groups, unreachable) = assign_seeded(graph, seeds, &fragment_of, &mut fragments);
    let attached = attach_orphans(graph, &fragment_of, &mut fragments);

    let mut unassigned = 0_usize;
    for fragment in &mut fragments {
        if fragment.group.is_none() {
            fragment.group = Some(groups.len());
            groups.push(GroupPlan {
                kind: GroupKind::Unassigned,
                label: None,
            });
            unassigned += 1;
        }
    }
    if unassigned > 0 {
        warn!(
            body = %graph.body(),
            unassigned,
            "regions with no path to any seed left unassigned"
        );
    }
    for warning in &unreachable {
        warn!(
            body = %graph.body(),
            label = %warning.label,
            seeds = warning.seeds.len(),
            "seeds of one label could not be joined"
        );
    }

    let group_of = fragment_of
        .iter()
        .map(|&fragment| group_id(fragments[fragment].group.unwrap_or_default()))
        .collect();
    debug!(
        fragments = fragments.len(),
        groups = groups.len(),
        attached,
        unassigned,
        "partition reconciled"
    );
    Reconciled {
        group_of,
        groups,
        unreachable,
    }
}

/// Numbers union-find components by their smallest node.
fn collect_fragments(raw: &RawPartition) -> (Vec<usize>, Vec<Fragment>) {
    let mut index_of_root = vec![usize::MAX; raw.component_of.len()];
    let mut fragment_of = Vec::with_capacity(raw.component_of.len());
    let mut fragments: Vec<Fragment> = Vec::new();
    for (node, &root) in raw.component_of.iter().enumerate() {
        if index_of_root[root] == usize::MAX {
            index_of_root[root] = fragments.len();
            fragments.push(Fragment {
                label: raw.labels.get(root).copied().flatten(),
                nodes: Vec::new(),
                group: None,
            });
        }
        let fragment = index_of_root[root];
        fragments[fragment].nodes.push(node);
        fragment_of.push(fragment);
    }
    (fragment_of, fragments)
}

/// Chooses each label's primary fragment and numbers the detached ones.
fn assign_seeded(
    graph: &AdjacencyGraph,
    seeds: &SeedMap,
    fragment_of: &[usize],
    fragments: &mut [Fragment],
) -> (Vec<GroupPlan>, Vec<UnreachableSeeds>) {
    let mut groups: Vec<GroupPlan> = seeds
        .labels()
        .iter()
        .map(|&label| GroupPlan {
            kind: GroupKind::Seeded,
            label: Some(label),
        })
        .collect();

    let mut by_label: Vec<Vec<usize>> = vec![Vec::new(); seeds.group_count()];
    for (index, fragment) in fragments.iter().enumerate() {
        if let Some(label) = fragment.label {
            by_label[label.index()].push(index);
        }
    }

    let mut primaries = vec![usize::MAX; by_label.len()];
    for (group, members) in by_label.iter().enumerate() {
        // Fragments are ordered by smallest node, so the first maximum wins ties.
        let Some(&primary) = members.iter().reduce(|best, candidate| {
            if fragments[*candidate].nodes.len() > fragments[*best].nodes.len() {
                candidate
            } else {
                best
            }
        }) else {
            continue;
        };
        fragments[primary].group = Some(group);
        primaries[group] = primary;
    }

    let mut unreachable = Vec::new();
    for (group, members) in by_label.iter().enumerate() {
        if members.len() < 2 {
            continue;
        }
        let label = seeds.labels()[group];
        let mut detached = Vec::with_capacity(members.len() - 1);
        for &fragment in members.iter().filter(|&&f| f != primaries[group]) {
            let id = groups.len();
            fragments[fragment].group = Some(id);
            groups.push(GroupPlan {
                kind: GroupKind::Detached,
                label: Some(label),
            });
            detached.push(group_id(id));
        }
        let stranded = seeds
            .seeds()
            .iter()
            .filter(|&&(node, seed)| seed.index() == group && fragment_of[node] != primaries[group])
            .map(|&(node, _)| graph.supervoxel(node))
            .collect();
        unreachable.push(UnreachableSeeds {
            label,
            seeds: stranded,
            detached,
        });
    }
    (groups, unreachable)
}

/// Attaches unlabelled fragments along their strongest edges.
fn attach_orphans(
    graph: &AdjacencyGraph,
    fragment_of: &[usize],
    fragments: &mut [Fragment],
) -> usize {
    let mut heap = BinaryHeap::new();
    for edge in graph.edges() {
        let (left, right) = (fragment_of[edge.source()], fragment_of[edge.target()]);
        match (fragments[left].group, fragments[right].group) {
            (Some(group), None) => heap.push(Attachment {
                edge,
                fragment: right,
                group,
            }),
            (None, Some(group)) => heap.push(Attachment {
                edge,
                fragment: left,
                group,
            }),
            _ => {}
        }
    }

    let mut attached = 0_usize;
    while let Some(candidate) = heap.pop() {
        if fragments[candidate.fragment].group.is_some() {
            continue;
        }
        fragments[candidate.fragment].group = Some(candidate.group);
        attached += 1;
        for &node in &fragments[candidate.fragment].nodes {
            for (neighbour, edge) in graph.neighbours(node) {
                let other = fragment_of[neighbour];
                if fragments[other].group.is_none() {
                    heap.push(Attachment {
                        edge,
                        fragment: other,
                        group: candidate.group,
                    });
                }
            }
        }
    }
    attached
}

#[cfg(test)]
mod tests;
