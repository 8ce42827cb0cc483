//! Benchmark parameter types.

use std::fmt;

use cleave_core::PartitionStrategy;

/// Parameters for one cleave benchmark run.
#[derive(Clone, Copy, Debug)]
pub struct CleaveBenchParams {
    /// Number of supervoxels in the synthetic body.
    pub supervoxels: u64,
    /// Partitioning strategy under test.
    pub strategy: PartitionStrategy,
}

impl fmt::Display for CleaveBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/n={}", self.strategy, self.supervoxels)
    }
}
