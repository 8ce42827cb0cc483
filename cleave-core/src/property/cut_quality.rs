//! Greedy cut quality, verified by replaying the agglomeration trace.
//!
//! - Decisions are taken in non-increasing confidence order, so no refused
//!   edge was stronger than evidence merged after it.
//! - Every cut edge at or above the merge threshold was explicitly refused
//!   because both sides already carried different seeds.

use std::collections::BTreeSet;

use proptest::{prop_assert, test_runner::TestCaseResult};

use crate::{PartitionStrategy, TraceEvent};

use super::{helpers::cleave, types::CleaveFixture};

/// Runs the cut-quality property for the given fixture.
pub(super) fn run_cut_quality_property(fixture: &CleaveFixture) -> TestCaseResult {
    for strategy in [
        PartitionStrategy::SeededAgglomeration,
        PartitionStrategy::MeanAffinity,
    ] {
        let outcome = cleave(fixture, strategy)?;
        let result = outcome.result();
        let trace = result.trace().unwrap_or_default();
        for pair in trace.windows(2) {
            prop_assert!(
                pair[0].weight() >= pair[1].weight(),
                "{strategy}: trace is not monotone: {:?} then {:?}",
                pair[0],
                pair[1]
            );
        }

        if strategy != PartitionStrategy::SeededAgglomeration {
            continue;
        }
        let blocked: BTreeSet<_> = trace
            .iter()
            .filter_map(|event| match *event {
                TraceEvent::Blocked { source, target, .. } => Some((source, target)),
                TraceEvent::Merged { .. } => None,
            })
            .collect();
        for edge in result.cut_edges() {
            if edge.weight < fixture.min_merge_weight {
                continue;
            }
            prop_assert!(
                blocked.contains(&(edge.source, edge.target)),
                "cut edge {}-{} ({}) was never refused",
                edge.source,
                edge.target,
                edge.weight
            );
        }
    }
    Ok(())
}
