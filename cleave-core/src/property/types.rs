//! Type definitions for cleave property-based tests.

use crate::{RawBodyGraph, SeedAssignments};

/// Shape of the generated body graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum BodyShape {
    /// Random sparse graph with a spanning path, so it is connected.
    Connected,
    /// Many edges share a handful of weights, stressing tie-breaking.
    ManyIdentical,
    /// Several pieces with no edges between them, plus isolated supervoxels.
    Fragmented,
    /// Weights spread around the merge threshold so orphans appear.
    Thresholded,
}

/// Fixture for cleave property tests.
#[derive(Clone, Debug)]
pub(super) struct CleaveFixture {
    /// Raw body graph as a store would return it.
    pub raw: RawBodyGraph,
    /// Seeds with at least two labels, all inside the body.
    pub seeds: SeedAssignments,
    /// Minimum merge weight to configure.
    pub min_merge_weight: f32,
    /// Generator shape, for failure diagnosis.
    pub shape: BodyShape,
}
