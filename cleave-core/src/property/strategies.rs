//! Strategy builders for cleave property-based tests.
//!
//! Bodies are generated from a seeded [`SmallRng`] so every failing case can
//! be replayed from its seed alone.

use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::SmallRng, seq::SliceRandom};

use crate::{BodyId, RawBodyGraph, RawEdge, SeedAssignments, SeedLabel, SupervoxelId};

use super::types::{BodyShape, CleaveFixture};

const MIN_NODES: usize = 6;
const MAX_NODES: usize = 48;

impl Arbitrary for BodyShape {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
        prop_oneof![
            1 => Just(Self::Connected),
            2 => Just(Self::ManyIdentical),
            1 => Just(Self::Fragmented),
            1 => Just(Self::Thresholded),
        ]
        .boxed()
    }
}

/// Generates fixtures across every body shape.
pub(super) fn cleave_fixture_strategy() -> impl Strategy<Value = CleaveFixture> {
    (any::<BodyShape>(), any::<u64>()).prop_map(|(shape, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(shape, &mut rng)
    })
}

/// Generates a fixture for a specific shape.
pub(super) fn generate_fixture(shape: BodyShape, rng: &mut SmallRng) -> CleaveFixture {
    let node_count = rng.gen_range(MIN_NODES..=MAX_NODES);
    // Sparse, non-contiguous identifiers like a real store hands out.
    let mut next = rng.gen_range(1_u64..1_000);
    let supervoxels: Vec<SupervoxelId> = (0..node_count)
        .map(|_| {
            next += rng.gen_range(1_u64..50);
            SupervoxelId::new(next)
        })
        .collect();

    let (edges, min_merge_weight, explicit) = match shape {
        BodyShape::Connected => (connected_edges(&supervoxels, rng, |r| r.r#gen()), 0.0, false),
        BodyShape::ManyIdentical => (
            connected_edges(&supervoxels, rng, |r| f32::from(r.gen_range(0_u8..4)) * 0.25),
            0.0,
            false,
        ),
        BodyShape::Fragmented => (fragmented_edges(&supervoxels, rng), 0.0, true),
        BodyShape::Thresholded => (
            connected_edges(&supervoxels, rng, |r| r.r#gen()),
            rng.gen_range(0.2_f32..0.6),
            false,
        ),
    };

    let raw = if explicit {
        RawBodyGraph::new(BodyId::new(1), supervoxels.clone(), edges)
    } else {
        RawBodyGraph::from_edges(BodyId::new(1), edges)
    };
    let seeds = generate_seeds(&raw, rng);
    CleaveFixture {
        raw,
        seeds,
        min_merge_weight,
        shape,
    }
}

fn connected_edges(
    supervoxels: &[SupervoxelId],
    rng: &mut SmallRng,
    mut weight: impl FnMut(&mut SmallRng) -> f32,
) -> Vec<RawEdge> {
    let mut order = supervoxels.to_vec();
    order.shuffle(rng);
    let mut edges: Vec<RawEdge> = order
        .windows(2)
        .map(|pair| RawEdge::new(pair[0], pair[1], weight(rng)))
        .collect();
    let extra = rng.gen_range(0..=supervoxels.len());
    for _ in 0..extra {
        let u = supervoxels[rng.gen_range(0..supervoxels.len())];
        let v = supervoxels[rng.gen_range(0..supervoxels.len())];
        let mut edge = RawEdge::new(u, v, weight(rng));
        if rng.gen_bool(0.3) {
            edge = edge.with_rank(rng.gen_range(0..100));
        }
        edges.push(edge);
    }
    edges
}

fn fragmented_edges(supervoxels: &[SupervoxelId], rng: &mut SmallRng) -> Vec<RawEdge> {
    let pieces = rng.gen_range(2..=4);
    let chunk = supervoxels.len().div_ceil(pieces);
    let mut edges = Vec::new();
    for piece in supervoxels.chunks(chunk) {
        // Leave the last member of each piece isolated.
        let Some((_, connected)) = piece.split_last() else {
            continue;
        };
        if connected.len() > 1 {
            edges.extend(connected_edges(connected, rng, |r| r.r#gen()));
        }
    }
    edges
}

/// Picks two to four labels, each holding one or two distinct supervoxels.
fn generate_seeds(raw: &RawBodyGraph, rng: &mut SmallRng) -> SeedAssignments {
    let mut nodes: Vec<SupervoxelId> = match raw.supervoxels() {
        Some(supervoxels) => supervoxels.to_vec(),
        None => raw.edges().iter().flat_map(|edge| [edge.u, edge.v]).collect(),
    };
    nodes.sort_unstable();
    nodes.dedup();
    nodes.shuffle(rng);

    let labels = rng.gen_range(2_u64..=4);
    let mut seeds = SeedAssignments::default();
    let mut pool = nodes.into_iter();
    for label in 0..labels {
        let per_label = rng.gen_range(1..=2);
        for supervoxel in pool.by_ref().take(per_label) {
            seeds.push(supervoxel, SeedLabel::new(100 + label * 7));
        }
    }
    seeds
}
