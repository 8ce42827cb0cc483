//! Structural invariants of every cleave result.
//!
//! - **Totality**: every supervoxel is assigned exactly once.
//! - **Connectivity**: every group induces a connected subgraph.
//! - **Seed fidelity**: every seed lands in a group carrying its label.
//! - **Cut completeness**: cut edges are exactly the edges between groups.

use std::collections::{BTreeSet, VecDeque};

use proptest::{prop_assert, prop_assert_eq, test_runner::TestCaseResult};

use crate::{AdjacencyGraph, CleaveResult, GroupKind};

use super::{
    helpers::{STRATEGIES, cleave, graph},
    types::CleaveFixture,
};

/// Runs the structural invariant property for the given fixture.
pub(super) fn run_structural_invariants_property(fixture: &CleaveFixture) -> TestCaseResult {
    let graph = graph(fixture)?;
    for strategy in STRATEGIES {
        let outcome = cleave(fixture, strategy)?;
        let result = outcome.result();
        validate_totality(&graph, result)?;
        validate_connectivity(&graph, result)?;
        validate_seeds(fixture, result)?;
        validate_cut_edges(&graph, result)?;

        let detached = result
            .groups()
            .iter()
            .any(|group| group.kind() == GroupKind::Detached);
        prop_assert_eq!(detached, !outcome.is_separated());
    }
    Ok(())
}

fn validate_totality(graph: &AdjacencyGraph, result: &CleaveResult) -> TestCaseResult {
    let assigned: Vec<_> = result.assignments().iter().map(|&(sv, _)| sv).collect();
    prop_assert_eq!(assigned.as_slice(), graph.supervoxels());

    let total: usize = result.groups().iter().map(|group| group.size()).sum();
    prop_assert_eq!(total, graph.node_count());
    for (index, group) in result.groups().iter().enumerate() {
        prop_assert_eq!(group.id().get() as usize, index);
        prop_assert!(group.size() > 0, "group {} is empty", group.id());
    }
    Ok(())
}

fn validate_connectivity(graph: &AdjacencyGraph, result: &CleaveResult) -> TestCaseResult {
    let group_of: Vec<_> = result.assignments().iter().map(|&(_, g)| g).collect();
    let mut visited = vec![false; graph.node_count()];
    let mut seen_groups = BTreeSet::new();
    for start in 0..graph.node_count() {
        if visited[start] {
            continue;
        }
        prop_assert!(
            seen_groups.insert(group_of[start]),
            "group {} is split into several pieces",
            group_of[start]
        );
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for (neighbour, _) in graph.neighbours(node) {
                if !visited[neighbour] && group_of[neighbour] == group_of[node] {
                    visited[neighbour] = true;
                    queue.push_back(neighbour);
                }
            }
        }
    }
    Ok(())
}

fn validate_seeds(fixture: &CleaveFixture, result: &CleaveResult) -> TestCaseResult {
    for &(supervoxel, label) in fixture.seeds.pairs() {
        let group = result
            .group_of(supervoxel)
            .and_then(|group| result.group(group));
        prop_assert!(group.is_some(), "seed {supervoxel} is unassigned");
        if let Some(group) = group {
            prop_assert_eq!(group.label(), Some(label));
            prop_assert!(group.seeds().contains(&supervoxel));
        }
    }
    Ok(())
}

fn validate_cut_edges(graph: &AdjacencyGraph, result: &CleaveResult) -> TestCaseResult {
    let expected: Vec<_> = graph
        .edges()
        .iter()
        .filter(|edge| {
            let (source, target) = graph.endpoints(edge);
            result.group_of(source) != result.group_of(target)
        })
        .map(|edge| graph.endpoints(edge))
        .collect();
    let actual: Vec<_> = result
        .cut_edges()
        .iter()
        .map(|edge| (edge.source, edge.target))
        .collect();
    prop_assert_eq!(actual, expected);
    Ok(())
}
