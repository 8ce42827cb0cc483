//! Synthetic over-merged bodies for benchmarking.
//!
//! A body is a cubic lattice of supervoxels joined to their six neighbours.
//! Two confidently merged halves meet at a weakly merged plane, mimicking a
//! false merge between two neurites. Weights come from a seeded RNG so runs
//! are reproducible.

use cleave_core::{
    BodyId, GraphSource, GraphSourceError, RawBodyGraph, RawEdge, SeedAssignments, SeedLabel,
    StoreVersion, SupervoxelId,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Errors that may occur during synthetic body generation.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyntheticError {
    /// The lattice side was too short to hold two distinct seeds.
    #[error("lattice side must be at least 2 (got {side})")]
    LatticeTooSmall {
        /// Requested side length.
        side: u64,
    },
}

/// Configuration for synthetic body generation.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticConfig {
    /// Supervoxels along each lattice axis; the body holds `side³`.
    pub side: u64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// A lattice body with one seed in each half.
///
/// # Examples
///
/// ```
/// use cleave_benches::source::{SyntheticBody, SyntheticConfig};
///
/// let body = SyntheticBody::generate(&SyntheticConfig { side: 4, seed: 7 }).expect("valid config");
/// assert_eq!(body.supervoxel_count(), 64);
/// assert_eq!(body.graph().edges().len(), 3 * 4 * 4 * 3);
/// ```
#[derive(Clone, Debug)]
pub struct SyntheticBody {
    graph: RawBodyGraph,
    seeds: SeedAssignments,
    supervoxels: u64,
}

impl SyntheticBody {
    /// Body identifier used for every synthetic body.
    pub const BODY: BodyId = BodyId::new(1);

    /// Generates a lattice body from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntheticError::LatticeTooSmall`] if `side < 2`.
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SyntheticError> {
        let side = config.side;
        if side < 2 {
            return Err(SyntheticError::LatticeTooSmall { side });
        }
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let plane = side >> 1;
        let id = |x: u64, y: u64, z: u64| SupervoxelId::new(1 + x + side * (y + side * z));

        let mut edges = Vec::new();
        for z in 0..side {
            for y in 0..side {
                for x in 0..side {
                    let here = id(x, y, z);
                    if x + 1 < side {
                        let weight = if x + 1 == plane {
                            rng.gen_range(0.0..0.2)
                        } else {
                            rng.gen_range(0.4..1.0)
                        };
                        edges.push(RawEdge::new(here, id(x + 1, y, z), weight));
                    }
                    if y + 1 < side {
                        edges.push(RawEdge::new(here, id(x, y + 1, z), rng.gen_range(0.4..1.0)));
                    }
                    if z + 1 < side {
                        edges.push(RawEdge::new(here, id(x, y, z + 1), rng.gen_range(0.4..1.0)));
                    }
                }
            }
        }

        let last = side - 1;
        let seeds = SeedAssignments::from_pairs([
            (id(0, 0, 0), SeedLabel::new(1)),
            (id(last, last, last), SeedLabel::new(2)),
        ]);
        Ok(Self {
            graph: RawBodyGraph::from_edges(Self::BODY, edges),
            seeds,
            supervoxels: side * side * side,
        })
    }

    /// Returns the body graph.
    #[must_use]
    pub const fn graph(&self) -> &RawBodyGraph {
        &self.graph
    }

    /// Returns the two operator seeds.
    #[must_use]
    pub const fn seeds(&self) -> &SeedAssignments {
        &self.seeds
    }

    /// Returns the number of supervoxels.
    #[must_use]
    pub const fn supervoxel_count(&self) -> u64 {
        self.supervoxels
    }
}

impl GraphSource for SyntheticBody {
    fn name(&self) -> &str {
        "synthetic-lattice"
    }

    fn fetch_body_graph(
        &self,
        body: BodyId,
        _version: &StoreVersion,
    ) -> Result<RawBodyGraph, GraphSourceError> {
        if body != Self::BODY {
            return Err(GraphSourceError::UnknownBody { body });
        }
        Ok(self.graph.clone())
    }
}
