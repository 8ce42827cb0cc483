//! Builder utilities for configuring the cleave engine.
//!
//! Validates strategy selection and numeric thresholds before constructing
//! [`Cleaver`] instances.

use crate::{
    Result, cleaver::Cleaver, error::CleaveError, graph::GraphBuilder,
    partition::PartitionStrategy,
};

/// Configures and constructs [`Cleaver`] instances.
///
/// # Examples
/// ```
/// use cleave_core::{CleaverBuilder, PartitionStrategy};
///
/// let cleaver = CleaverBuilder::new()
///     .with_strategy(PartitionStrategy::MeanAffinity)
///     .with_min_merge_weight(0.2)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(cleaver.strategy(), PartitionStrategy::MeanAffinity);
/// assert_eq!(cleaver.min_merge_weight(), 0.2);
/// ```
#[derive(Debug, Clone)]
pub struct CleaverBuilder {
    strategy: PartitionStrategy,
    foreign_edge_tolerance: f32,
    min_merge_weight: f32,
    record_trace: bool,
}

impl Default for CleaverBuilder {
    fn default() -> Self {
        Self {
            strategy: PartitionStrategy::default(),
            foreign_edge_tolerance: GraphBuilder::DEFAULT_FOREIGN_EDGE_TOLERANCE,
            min_merge_weight: 0.0,
            record_trace: false,
        }
    }
}

impl CleaverBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use cleave_core::{CleaverBuilder, PartitionStrategy};
    ///
    /// let builder = CleaverBuilder::new();
    /// assert_eq!(builder.strategy(), PartitionStrategy::SeededAgglomeration);
    /// assert_eq!(builder.foreign_edge_tolerance(), 0.01);
    /// assert!(!builder.record_trace());
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the partitioning strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: PartitionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the configured partitioning strategy.
    #[must_use]
    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    /// Sets the fraction of supplied edges that may lie entirely outside the
    /// body before the graph is rejected as inconsistent.
    #[must_use]
    pub fn with_foreign_edge_tolerance(mut self, tolerance: f32) -> Self {
        self.foreign_edge_tolerance = tolerance;
        self
    }

    /// Returns the configured foreign-edge tolerance.
    #[must_use]
    pub fn foreign_edge_tolerance(&self) -> f32 {
        self.foreign_edge_tolerance
    }

    /// Sets the weight below which edges never drive a merge.
    ///
    /// Regions reachable only through weaker edges are left to orphan
    /// attachment.
    ///
    /// # Examples
    /// ```
    /// use cleave_core::CleaverBuilder;
    ///
    /// let builder = CleaverBuilder::new().with_min_merge_weight(0.3);
    /// assert_eq!(builder.min_merge_weight(), 0.3);
    /// ```
    #[must_use]
    pub fn with_min_merge_weight(mut self, weight: f32) -> Self {
        self.min_merge_weight = weight;
        self
    }

    /// Returns the configured minimum merge weight.
    #[must_use]
    pub fn min_merge_weight(&self) -> f32 {
        self.min_merge_weight
    }

    /// Keeps the agglomeration trace in every result.
    #[must_use]
    pub fn with_record_trace(mut self, record: bool) -> Self {
        self.record_trace = record;
        self
    }

    /// Returns whether the agglomeration trace is kept.
    #[must_use]
    pub fn record_trace(&self) -> bool {
        self.record_trace
    }

    /// Validates the configuration and constructs a [`Cleaver`].
    ///
    /// # Errors
    /// Returns [`CleaveError::InvalidConfiguration`] when the foreign-edge
    /// tolerance lies outside `[0, 1]` or the minimum merge weight is negative
    /// or not finite.
    ///
    /// # Examples
    /// ```
    /// use cleave_core::{CleaveError, CleaverBuilder};
    ///
    /// let err = CleaverBuilder::new()
    ///     .with_min_merge_weight(-1.0)
    ///     .build()
    ///     .expect_err("negative weights are rejected");
    /// assert!(matches!(err, CleaveError::InvalidConfiguration { .. }));
    /// ```
    pub fn build(self) -> Result<Cleaver> {
        let graph_builder = GraphBuilder::new(self.foreign_edge_tolerance)?;
        if !self.min_merge_weight.is_finite() || self.min_merge_weight < 0.0 {
            return Err(CleaveError::InvalidConfiguration {
                parameter: "min_merge_weight",
                reason: "must be a finite, non-negative weight",
            });
        }
        Ok(Cleaver::new(
            self.strategy,
            graph_builder,
            self.min_merge_weight,
            self.record_trace,
        ))
    }
}
