//! Seed-constrained Kruskal over individually sorted edges.

use tracing::trace;

use crate::{Result, cancel::CancellationToken, graph::AdjacencyGraph, seeds::SeedMap};

use super::{
    PartitionSettings, Partitioner, RawPartition, sorted_edge_indices,
    trace_event, union_find::LabelledDisjointSet,
};

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SeededAgglomeration;

impl Partitioner for SeededAgglomeration {
    fn partition(
        &self,
        graph: &AdjacencyGraph,
        seeds: &SeedMap,
        settings: PartitionSettings,
        cancel: &CancellationToken,
    ) -> Result<RawPartition> {
        cancel.check("sort")?;
        let order = sorted_edge_indices(graph);
        cancel.check("union")?;

        let poll_interval = settings.cancel_poll_interval.get();
        let mut sets = LabelledDisjointSet::new(seeds.node_labels(graph.node_count()));
        let mut events = settings.record_trace.then(Vec::new);
        let mut merged = 0_usize;
        let mut blocked = 0_usize;

        for (step, &index) in order.iter().enumerate() {
            if step > 0 && step % poll_interval == 0 {
                cancel.check("union")?;
            }
            let edge = &graph.edges()[index];
            // Remaining edges are no stronger than this one.
            if edge.weight() < settings.min_merge_weight {
                break;
            }
            let left = sets.find(edge.source());
            let right = sets.find(edge.target());
            if left == right {
                continue;
            }
            let accepted = !sets.conflicts(left, right);
            if accepted {
                sets.union_roots(left, right);
                merged += 1;
            } else {
                blocked += 1;
            }
            if let Some(events) = events.as_mut() {
                events.push(trace_event(graph, edge, accepted));
            }
        }

        trace!(merged, blocked, "edge pass complete");
        let (component_of, labels) = sets.into_components();
        Ok(RawPartition {
            component_of,
            labels,
            trace: events,
        })
    }
}
