//! Cleave engine: seed-driven splitting of over-merged neuron bodies.
//!
//! Given a body's supervoxel adjacency graph and a handful of operator seeds,
//! the engine partitions every supervoxel into connected groups, one per seed
//! label, cutting along the least confident merge evidence. The pipeline is
//! linear:
//!
//! 1. [`GraphBuilder`] turns store data into an [`AdjacencyGraph`].
//! 2. [`SeedMap::resolve`] validates the seeds against that graph.
//! 3. A [`PartitionStrategy`] agglomerates supervoxels without ever joining
//!    two seed labels.
//! 4. The reconciler keeps every group connected and places orphan regions.
//! 5. The assembler produces an immutable [`CleaveResult`].
//!
//! [`Cleaver`] runs the whole pipeline; it performs no I/O of its own beyond
//! the single [`GraphSource`] fetch at the start of a request.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
#[cfg(feature = "cache")]
mod cache;
mod cancel;
mod cleaver;
mod error;
mod graph;
mod ids;
mod partition;
mod reconcile;
mod result;
mod seeds;
mod source;

#[cfg(test)]
mod property;
#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(feature = "cache")]
#[cfg_attr(docsrs, doc(cfg(feature = "cache")))]
pub use crate::cache::{CachedGraphSource, GraphCacheConfig};
pub use crate::{
    builder::CleaverBuilder,
    cancel::CancellationToken,
    cleaver::{CleaveRequest, Cleaver},
    error::{CleaveError, CleaveErrorCode, GraphSourceError, GraphSourceErrorCode, Result},
    graph::{AdjacencyGraph, GraphBuilder, GraphEdge, RawBodyGraph, RawEdge},
    ids::{BodyId, GroupId, SeedLabel, StoreVersion, SupervoxelId},
    partition::{PartitionStrategy, TraceEvent},
    result::{
        CleaveOutcome, CleaveResult, CutEdge, GroupKind, GroupSummary, UnreachableSeeds,
    },
    seeds::{SeedAssignments, SeedMap},
    source::GraphSource,
};
