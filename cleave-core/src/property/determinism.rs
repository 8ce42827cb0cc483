//! Determinism: identical input yields identical results.
//!
//! Repeated runs must agree, and so must runs over the same distinct edges
//! presented in another order or with the seed pairs permuted.

use std::collections::BTreeMap;

use proptest::{prop_assert_eq, test_runner::TestCaseResult};
use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};

use crate::{RawBodyGraph, RawEdge, SeedAssignments, SupervoxelId};

use super::{
    helpers::{STRATEGIES, cleave},
    types::CleaveFixture,
};

const REPETITIONS: usize = 3;

/// Runs the determinism property for the given fixture.
pub(super) fn run_determinism_property(fixture: &CleaveFixture, seed: u64) -> TestCaseResult {
    let permuted = permute(fixture, seed);
    for strategy in STRATEGIES {
        let baseline = cleave(fixture, strategy)?;
        for _ in 0..REPETITIONS {
            prop_assert_eq!(&cleave(fixture, strategy)?, &baseline);
        }
        let reordered = cleave(&permuted, strategy)?;
        prop_assert_eq!(reordered.result().assignments(), baseline.result().assignments());
        prop_assert_eq!(reordered.result().cut_edges(), baseline.result().cut_edges());
        prop_assert_eq!(reordered.result().groups(), baseline.result().groups());
    }
    Ok(())
}

/// Collapses duplicates (last occurrence wins) and shuffles edges and seeds.
fn permute(fixture: &CleaveFixture, seed: u64) -> CleaveFixture {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut unique: BTreeMap<(SupervoxelId, SupervoxelId), RawEdge> = BTreeMap::new();
    for edge in fixture.raw.edges() {
        unique.insert((edge.u.min(edge.v), edge.u.max(edge.v)), *edge);
    }
    let mut edges: Vec<RawEdge> = unique
        .into_values()
        .map(|edge| RawEdge { u: edge.v, v: edge.u, ..edge })
        .collect();
    edges.shuffle(&mut rng);

    let raw = match fixture.raw.supervoxels() {
        Some(supervoxels) => {
            let mut supervoxels = supervoxels.to_vec();
            supervoxels.shuffle(&mut rng);
            RawBodyGraph::new(fixture.raw.body(), supervoxels, edges)
        }
        None => RawBodyGraph::from_edges(fixture.raw.body(), edges),
    };
    let mut pairs = fixture.seeds.pairs().to_vec();
    pairs.shuffle(&mut rng);
    CleaveFixture {
        raw,
        seeds: SeedAssignments::from_pairs(pairs),
        min_merge_weight: fixture.min_merge_weight,
        shape: fixture.shape,
    }
}
