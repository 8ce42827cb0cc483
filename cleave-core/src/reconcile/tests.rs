//! Unit tests for partition reconciliation.

use rstest::rstest;

use crate::{
    cancel::CancellationToken,
    graph::{AdjacencyGraph, GraphBuilder, RawBodyGraph, RawEdge},
    ids::{BodyId, GroupId, SeedLabel, SupervoxelId},
    partition::{CANCEL_POLL_INTERVAL, PartitionSettings, PartitionStrategy, partition},
    result::{GroupKind, UnreachableSeeds},
    seeds::{SeedAssignments, SeedMap},
};

use super::{Reconciled, reconcile};

fn sv(id: u64) -> SupervoxelId {
    SupervoxelId::new(id)
}

fn build(supervoxels: &[u64], edges: &[(u64, u64, f32)]) -> AdjacencyGraph {
    let edges = edges
        .iter()
        .map(|&(u, v, weight)| RawEdge::new(sv(u), sv(v), weight))
        .collect();
    let supervoxels = supervoxels.iter().copied().map(sv).collect();
    GraphBuilder::default()
        .build(&RawBodyGraph::new(BodyId::new(1), supervoxels, edges))
        .expect("test graph must build")
}

fn run(graph: &AdjacencyGraph, pairs: &[(u64, u64)], min_merge_weight: f32) -> Reconciled {
    let assignments: SeedAssignments = pairs
        .iter()
        .map(|&(supervoxel, label)| (sv(supervoxel), SeedLabel::new(label)))
        .collect();
    let seeds = SeedMap::resolve(graph, &assignments).expect("test seeds must resolve");
    let raw = partition(
        PartitionStrategy::SeededAgglomeration,
        graph,
        &seeds,
        PartitionSettings {
            min_merge_weight,
            record_trace: false,
            cancel_poll_interval: CANCEL_POLL_INTERVAL,
        },
        &CancellationToken::new(),
    )
    .expect("partition must succeed");
    reconcile(graph, &seeds, &raw)
}

fn group_of(graph: &AdjacencyGraph, reconciled: &Reconciled, supervoxel: u64) -> GroupId {
    let node = graph.index_of(sv(supervoxel)).expect("supervoxel in graph");
    reconciled.group_of[node]
}

#[test]
fn orphans_follow_their_strongest_edge() {
    let graph = build(
        &[1, 2, 3, 4, 5, 6],
        &[
            (1, 2, 0.9),
            (3, 4, 0.9),
            (2, 5, 0.2),
            (3, 5, 0.3),
            (5, 6, 0.1),
        ],
    );
    let reconciled = run(&graph, &[(1, 10), (4, 20)], 0.5);

    assert_eq!(group_of(&graph, &reconciled, 5), GroupId::new(1));
    assert_eq!(group_of(&graph, &reconciled, 6), GroupId::new(1));
    assert_eq!(group_of(&graph, &reconciled, 2), GroupId::new(0));
    assert_eq!(reconciled.groups.len(), 2);
    assert!(reconciled.unreachable.is_empty());
}

#[test]
fn orphan_chains_prefer_the_strongest_route_over_a_direct_neighbour() {
    let graph = build(
        &[1, 2, 3, 4, 10, 11],
        &[
            (1, 2, 0.9),
            (2, 10, 0.05),
            (10, 11, 0.09),
            (11, 3, 0.04),
            (3, 4, 0.9),
        ],
    );
    let reconciled = run(&graph, &[(1, 10), (4, 20)], 0.1);

    assert_eq!(group_of(&graph, &reconciled, 10), GroupId::new(0));
    // 11 touches group 1 directly, but only along the weakest edge.
    assert_eq!(group_of(&graph, &reconciled, 11), GroupId::new(0));
    assert_eq!(group_of(&graph, &reconciled, 3), GroupId::new(1));
    assert_eq!(reconciled.groups.len(), 2);
}

#[rstest]
#[case::zero_threshold(0.0)]
#[case::high_threshold(0.95)]
fn isolated_regions_become_unassigned(#[case] min_merge_weight: f32) {
    let graph = build(&[1, 2, 3, 7, 8], &[(1, 2, 0.9), (2, 3, 0.1), (7, 8, 0.6)]);
    let reconciled = run(&graph, &[(1, 10), (3, 20)], min_merge_weight);

    for supervoxel in [7, 8] {
        let unassigned = group_of(&graph, &reconciled, supervoxel);
        let plan = reconciled.groups[unassigned.index()];
        assert_eq!(plan.kind, GroupKind::Unassigned);
        assert_eq!(plan.label, None);
        assert!(unassigned.index() >= 2);
    }
    assert_eq!(group_of(&graph, &reconciled, 2), GroupId::new(0));
}

#[test]
fn seeds_split_by_another_label_are_detached() {
    let graph = build(&[1, 2, 3, 4], &[(1, 2, 0.5), (2, 3, 0.5), (3, 4, 0.9)]);
    let reconciled = run(&graph, &[(1, 10), (2, 20), (4, 10)], 0.0);

    assert_eq!(group_of(&graph, &reconciled, 3), GroupId::new(0));
    assert_eq!(group_of(&graph, &reconciled, 4), GroupId::new(0));
    assert_eq!(group_of(&graph, &reconciled, 2), GroupId::new(1));
    assert_eq!(group_of(&graph, &reconciled, 1), GroupId::new(2));
    assert_eq!(reconciled.groups[2].kind, GroupKind::Detached);
    assert_eq!(reconciled.groups[2].label, Some(SeedLabel::new(10)));
    assert_eq!(
        reconciled.unreachable,
        vec![UnreachableSeeds {
            label: SeedLabel::new(10),
            seeds: vec![sv(1)],
            detached: vec![GroupId::new(2)],
        }]
    );
}

#[test]
fn equal_fragments_keep_the_smallest_supervoxel_primary() {
    let graph = build(&[1, 2, 3], &[(1, 2, 0.5), (2, 3, 0.5)]);
    let reconciled = run(&graph, &[(1, 10), (2, 20), (3, 10)], 0.0);

    assert_eq!(group_of(&graph, &reconciled, 1), GroupId::new(0));
    assert_eq!(group_of(&graph, &reconciled, 3), GroupId::new(2));
    assert_eq!(reconciled.unreachable[0].seeds, vec![sv(3)]);
}
