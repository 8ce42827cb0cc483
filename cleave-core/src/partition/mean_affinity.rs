//! Average-linkage agglomeration constrained by seeds.
//!
//! Adjacent components are linked by the mean weight of every edge between
//! them. The strongest link is merged first and the links of the merged
//! component are re-averaged. Heap entries are stamped with the generation of
//! both roots; an entry whose stamps no longer match is stale and skipped.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap},
};

use tracing::trace;

use crate::{Result, cancel::CancellationToken, graph::AdjacencyGraph, seeds::SeedMap};

use super::{
    PartitionSettings, Partitioner, RawPartition, TraceEvent, compare_ranks,
    union_find::LabelledDisjointSet,
};

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct MeanAffinity;

/// Aggregated evidence between two components.
#[derive(Debug, Clone, Copy)]
struct Link {
    weight_sum: f64,
    count: u32,
    rank: Option<u64>,
    /// Smallest `(source, target)` node pair among the aggregated edges.
    pair: (usize, usize),
}

impl Link {
    fn mean(&self) -> f64 {
        self.weight_sum / f64::from(self.count.max(1))
    }

    fn absorb(&mut self, other: &Self) {
        self.weight_sum += other.weight_sum;
        self.count = self.count.saturating_add(other.count);
        if compare_ranks(other.rank, self.rank).is_lt() {
            self.rank = other.rank;
        }
        self.pair = self.pair.min(other.pair);
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    mean: f64,
    rank: Option<u64>,
    pair: (usize, usize),
    roots: (usize, usize),
    stamps: (u64, u64),
}

impl Ord for Candidate {
    // Greatest is merged first: highest mean, earliest rank, smallest pair.
    fn cmp(&self, other: &Self) -> Ordering {
        self.mean
            .total_cmp(&other.mean)
            .then_with(|| compare_ranks(other.rank, self.rank))
            .then_with(|| other.pair.cmp(&self.pair))
            .then_with(|| other.roots.cmp(&self.roots))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Candidate {}

struct State {
    sets: LabelledDisjointSet,
    links: Vec<BTreeMap<usize, Link>>,
    generation: Vec<u64>,
    heap: BinaryHeap<Candidate>,
}

impl State {
    fn new(graph: &AdjacencyGraph, seeds: &SeedMap) -> Self {
        let n = graph.node_count();
        let mut links: Vec<BTreeMap<usize, Link>> = vec![BTreeMap::new(); n];
        for edge in graph.edges() {
            let link = Link {
                weight_sum: f64::from(edge.weight()),
                count: 1,
                rank: edge.rank(),
                pair: (edge.source(), edge.target()),
            };
            links[edge.source()].insert(edge.target(), link);
            links[edge.target()].insert(edge.source(), link);
        }
        let mut state = Self {
            sets: LabelledDisjointSet::new(seeds.node_labels(n)),
            links,
            generation: vec![0; n],
            heap: BinaryHeap::with_capacity(graph.edge_count()),
        };
        for root in 0..n {
            state.push_links(root, |_, neighbour| root < neighbour);
        }
        state
    }

    /// Queues the links of `root` to every neighbour accepted by `keep`.
    fn push_links(&mut self, root: usize, keep: impl Fn(&LabelledDisjointSet, usize) -> bool) {
        let Self {
            sets,
            links,
            generation,
            heap,
        } = self;
        for (&neighbour, link) in &links[root] {
            if !keep(sets, neighbour) {
                continue;
            }
            heap.push(Candidate {
                mean: link.mean(),
                rank: link.rank,
                pair: link.pair,
                roots: (root, neighbour),
                stamps: (generation[root], generation[neighbour]),
            });
        }
    }

    fn is_current(&self, candidate: &Candidate) -> bool {
        let (left, right) = candidate.roots;
        candidate.stamps == (self.generation[left], self.generation[right])
    }

    fn merge(&mut self, left: usize, right: usize) {
        let (survivor, absorbed) = self.sets.union_roots(left, right);
        let moved = std::mem::take(&mut self.links[absorbed]);
        self.links[survivor].remove(&absorbed);
        for (neighbour, link) in moved {
            if neighbour == survivor {
                continue;
            }
            self.links[neighbour].remove(&absorbed);
            let combined = match self.links[survivor].get_mut(&neighbour) {
                Some(existing) => {
                    existing.absorb(&link);
                    *existing
                }
                None => {
                    self.links[survivor].insert(neighbour, link);
                    link
                }
            };
            self.links[neighbour].insert(survivor, combined);
        }
        self.generation[survivor] += 1;
        self.generation[absorbed] += 1;
        // Labels only accumulate, so a refused pair stays refused.
        self.push_links(survivor, |sets, neighbour| !sets.conflicts(survivor, neighbour));
    }
}

impl Partitioner for MeanAffinity {
    fn partition(
        &self,
        graph: &AdjacencyGraph,
        seeds: &SeedMap,
        settings: PartitionSettings,
        cancel: &CancellationToken,
    ) -> Result<RawPartition> {
        cancel.check("sort")?;
        let mut state = State::new(graph, seeds);
        cancel.check("union")?;

        let threshold = f64::from(settings.min_merge_weight);
        let mut events = settings.record_trace.then(Vec::new);
        let poll_interval = settings.cancel_poll_interval.get();
        let mut step = 0_usize;
        let mut merged = 0_usize;
        let mut blocked = 0_usize;

        while let Some(candidate) = state.heap.pop() {
            step += 1;
            if step % poll_interval == 0 {
                cancel.check("union")?;
            }
            if !state.is_current(&candidate) {
                continue;
            }
            // Merged links are averages of current links, so nothing stronger
            // can appear once the best current link is below threshold.
            if candidate.mean < threshold {
                break;
            }
            let (left, right) = candidate.roots;
            let accepted = !state.sets.conflicts(left, right);
            if accepted {
                state.merge(left, right);
                merged += 1;
            } else {
                blocked += 1;
            }
            if let Some(events) = events.as_mut() {
                let (source, target) = candidate.pair;
                let (source, target) = (graph.supervoxel(source), graph.supervoxel(target));
                let weight = candidate.mean as f32;
                events.push(if accepted {
                    TraceEvent::Merged {
                        source,
                        target,
                        weight,
                    }
                } else {
                    TraceEvent::Blocked {
                        source,
                        target,
                        weight,
                    }
                });
            }
        }

        trace!(merged, blocked, "mean affinity agglomeration complete");
        let (component_of, labels) = state.sets.into_components();
        Ok(RawPartition {
            component_of,
            labels,
            trace: events,
        })
    }
}
