//! Cleave orchestration: fetch, build, resolve, partition, reconcile, assemble.

use std::{collections::BTreeSet, time::Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::{
    Result,
    cancel::CancellationToken,
    error::CleaveError,
    graph::{GraphBuilder, RawBodyGraph},
    ids::{BodyId, StoreVersion},
    partition::{self, CANCEL_POLL_INTERVAL, PartitionSettings, PartitionStrategy},
    reconcile::reconcile,
    result::{CleaveOutcome, assemble},
    seeds::{SeedAssignments, SeedMap},
    source::GraphSource,
};

/// One body and its seeds, as submitted to [`Cleaver::cleave_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaveRequest {
    /// Body to cleave.
    pub body: BodyId,
    /// Operator seeds for that body.
    pub seeds: SeedAssignments,
}

impl CleaveRequest {
    /// Bundles `body` with its `seeds`.
    #[must_use]
    pub fn new(body: BodyId, seeds: SeedAssignments) -> Self {
        Self { body, seeds }
    }
}

/// Entry point for running cleaves.
///
/// A `Cleaver` holds only validated configuration; every call works on data
/// it owns for the duration of the call, so one instance can serve any number
/// of threads.
///
/// # Examples
/// ```
/// use cleave_core::{
///     BodyId, CancellationToken, CleaverBuilder, GroupId, RawBodyGraph, RawEdge,
///     SeedAssignments, SeedLabel, SupervoxelId,
/// };
///
/// let sv = SupervoxelId::new;
/// let raw = RawBodyGraph::from_edges(
///     BodyId::new(1),
///     vec![
///         RawEdge::new(sv(1), sv(2), 0.9),
///         RawEdge::new(sv(2), sv(3), 0.1),
///         RawEdge::new(sv(3), sv(4), 0.8),
///     ],
/// );
/// let seeds = SeedAssignments::from_pairs([(sv(1), SeedLabel::new(1)), (sv(4), SeedLabel::new(2))]);
///
/// let cleaver = CleaverBuilder::new().build()?;
/// let result = cleaver
///     .cleave_graph(&raw, &seeds, &CancellationToken::new())?
///     .into_separated()?;
/// assert_eq!(result.group_of(sv(2)), Some(GroupId::new(0)));
/// assert_eq!(result.group_of(sv(3)), Some(GroupId::new(1)));
/// assert_eq!(result.max_cut_weight(), Some(0.1));
/// # Ok::<(), cleave_core::CleaveError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Cleaver {
    strategy: PartitionStrategy,
    graph_builder: GraphBuilder,
    min_merge_weight: f32,
    record_trace: bool,
}

impl Cleaver {
    pub(crate) fn new(
        strategy: PartitionStrategy,
        graph_builder: GraphBuilder,
        min_merge_weight: f32,
        record_trace: bool,
    ) -> Self {
        Self {
            strategy,
            graph_builder,
            min_merge_weight,
            record_trace,
        }
    }

    /// Returns the partitioning strategy.
    #[must_use]
    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    /// Returns the foreign-edge tolerance applied when building graphs.
    #[must_use]
    pub fn foreign_edge_tolerance(&self) -> f32 {
        self.graph_builder.foreign_edge_tolerance()
    }

    /// Returns the weight below which edges never drive a merge.
    #[must_use]
    pub fn min_merge_weight(&self) -> f32 {
        self.min_merge_weight
    }

    /// Returns whether results carry the agglomeration trace.
    #[must_use]
    pub fn record_trace(&self) -> bool {
        self.record_trace
    }

    /// Fetches `body` at `version` from `source` and cleaves it.
    ///
    /// # Errors
    /// Returns [`CleaveError::GraphSource`] when the fetch fails, plus every
    /// error documented on [`Cleaver::cleave_graph`].
    #[instrument(
        name = "cleave.run",
        err,
        skip(self, source, seeds, cancel),
        fields(
            source = %source.name(),
            body = %body,
            version = %version,
            strategy = %self.strategy,
            seeds = seeds.len(),
        ),
    )]
    pub fn cleave<S: GraphSource + ?Sized>(
        &self,
        source: &S,
        body: BodyId,
        version: &StoreVersion,
        seeds: &SeedAssignments,
        cancel: &CancellationToken,
    ) -> Result<CleaveOutcome> {
        let started = Instant::now();
        let raw = source
            .fetch_body_graph(body, version)
            .map_err(|error| CleaveError::GraphSource { body, error })?;
        let outcome = self.cleave_graph(&raw, seeds, cancel)?;
        record_latency(started);
        let result = outcome.result();
        info!(
            groups = result.groups().len(),
            cut_edges = result.cut_edges().len(),
            separated = outcome.is_separated(),
            "cleave completed"
        );
        Ok(outcome)
    }

    /// Cleaves an already fetched body graph.
    ///
    /// # Errors
    /// Returns graph construction errors ([`CleaveError::EmptyBody`],
    /// [`CleaveError::InconsistentGraph`], [`CleaveError::InvalidEdgeWeight`]),
    /// seed errors ([`CleaveError::UnknownSeed`],
    /// [`CleaveError::InsufficientSeeds`], [`CleaveError::ConflictingSeed`])
    /// and [`CleaveError::Cancelled`].
    pub fn cleave_graph(
        &self,
        raw: &RawBodyGraph,
        seeds: &SeedAssignments,
        cancel: &CancellationToken,
    ) -> Result<CleaveOutcome> {
        cancel.check("build_graph")?;
        let graph = self.graph_builder.build(raw)?;
        let seeds = SeedMap::resolve(&graph, seeds)?;
        let settings = PartitionSettings {
            min_merge_weight: self.min_merge_weight,
            record_trace: self.record_trace,
            cancel_poll_interval: CANCEL_POLL_INTERVAL,
        };
        let mut raw_partition =
            partition::partition(self.strategy, &graph, &seeds, settings, cancel)?;
        cancel.check("reconcile")?;
        let trace = raw_partition.trace.take();
        let reconciled = reconcile(&graph, &seeds, &raw_partition);
        Ok(assemble(&graph, &seeds, reconciled, trace))
    }

    /// Cleaves several distinct bodies in parallel.
    ///
    /// Results are returned in request order; one failing body does not stop
    /// the others.
    ///
    /// # Errors
    /// Returns [`CleaveError::DuplicateBody`] before any work starts when the
    /// same body is requested twice.
    #[instrument(
        name = "cleave.batch",
        err,
        skip(self, source, requests, cancel),
        fields(source = %source.name(), version = %version, requests = requests.len()),
    )]
    pub fn cleave_batch<S: GraphSource + Sync + ?Sized>(
        &self,
        source: &S,
        version: &StoreVersion,
        requests: &[CleaveRequest],
        cancel: &CancellationToken,
    ) -> Result<Vec<Result<CleaveOutcome>>> {
        let mut seen = BTreeSet::new();
        for request in requests {
            if !seen.insert(request.body) {
                return Err(CleaveError::DuplicateBody { body: request.body });
            }
        }
        let run = |request: &CleaveRequest| {
            self.cleave(source, request.body, version, &request.seeds, cancel)
        };
        #[cfg(feature = "parallel")]
        let outcomes = requests.par_iter().map(run).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes = requests.iter().map(run).collect();
        Ok(outcomes)
    }
}

#[cfg(feature = "metrics")]
fn record_latency(started: Instant) {
    metrics::histogram!("cleave_latency_seconds").record(started.elapsed().as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
fn record_latency(_started: Instant) {}
