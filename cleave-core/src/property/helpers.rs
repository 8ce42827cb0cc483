//! Helpers shared by the cleave property runners.

use proptest::test_runner::TestCaseError;

use crate::{
    AdjacencyGraph, CancellationToken, CleaveOutcome, CleaverBuilder, GraphBuilder,
    PartitionStrategy,
};

use super::types::CleaveFixture;

/// Both strategies; every property must hold for each.
pub(super) const STRATEGIES: [PartitionStrategy; 2] = [
    PartitionStrategy::SeededAgglomeration,
    PartitionStrategy::MeanAffinity,
];

/// Runs a traced cleave of `fixture` with `strategy`.
pub(super) fn cleave(
    fixture: &CleaveFixture,
    strategy: PartitionStrategy,
) -> Result<CleaveOutcome, TestCaseError> {
    let cleaver = CleaverBuilder::new()
        .with_strategy(strategy)
        .with_min_merge_weight(fixture.min_merge_weight)
        .with_record_trace(true)
        .build()
        .map_err(|e| TestCaseError::fail(format!("builder rejected fixture: {e}")))?;
    cleaver
        .cleave_graph(&fixture.raw, &fixture.seeds, &CancellationToken::new())
        .map_err(|e| {
            TestCaseError::fail(format!(
                "cleave failed: {e} (shape={:?}, strategy={strategy}, edges={})",
                fixture.shape,
                fixture.raw.edges().len(),
            ))
        })
}

/// Builds the adjacency graph the engine sees for `fixture`.
pub(super) fn graph(fixture: &CleaveFixture) -> Result<AdjacencyGraph, TestCaseError> {
    GraphBuilder::default()
        .build(&fixture.raw)
        .map_err(|e| TestCaseError::fail(format!("graph failed to build: {e}")))
}
