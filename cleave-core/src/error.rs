//! Error types for the cleave engine.
//!
//! Every failure carries the identifiers an operator-facing message needs and
//! maps to a stable code so the service layer never matches on message text.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::ids::{BodyId, SeedLabel, SupervoxelId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by a [`crate::GraphSource`] while fetching a body graph.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphSourceError {
    /// The store could not be reached or answered with a server error.
    #[error("segmentation store unavailable: {reason}")]
    StoreUnavailable {
        /// Description reported by the transport or the store.
        reason: Arc<str>,
    },
    /// The store has no body with the requested identifier at this version.
    #[error("body {body} does not exist at the requested version")]
    UnknownBody {
        /// Body that was requested.
        body: BodyId,
    },
}

define_error_codes! {
    /// Stable codes describing [`GraphSourceError`] variants.
    enum GraphSourceErrorCode for GraphSourceError {
        /// The store could not be reached.
        StoreUnavailable => StoreUnavailable { .. } => "GRAPH_SOURCE_STORE_UNAVAILABLE",
        /// The body does not exist.
        UnknownBody => UnknownBody { .. } => "GRAPH_SOURCE_UNKNOWN_BODY",
    }
}

/// Error type produced when configuring or running a cleave.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CleaveError {
    /// A builder parameter was outside its accepted range.
    #[error("invalid configuration for `{parameter}`: {reason}")]
    InvalidConfiguration {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// The body has no supervoxels.
    #[error("body {body} has no supervoxels")]
    EmptyBody {
        /// Body that was empty.
        body: BodyId,
    },
    /// Too many supplied edges lie entirely outside the body, which points at
    /// stale or corrupted membership data.
    #[error(
        "body {body}: {foreign_edges} of {total_edges} edges reference no supervoxel of the body \
         (e.g. {}-{})", .example.0, .example.1
    )]
    InconsistentGraph {
        /// Body whose graph was being built.
        body: BodyId,
        /// Number of edges with neither endpoint in the body.
        foreign_edges: usize,
        /// Number of edges supplied by the store.
        total_edges: usize,
        /// First offending edge, for the operator message.
        example: (SupervoxelId, SupervoxelId),
    },
    /// An edge inside the body carried a negative or non-finite weight.
    #[error("edge {source_id}-{target_id} has invalid weight {weight}")]
    InvalidEdgeWeight {
        /// Smaller endpoint of the offending edge.
        source_id: SupervoxelId,
        /// Larger endpoint of the offending edge.
        target_id: SupervoxelId,
        /// Weight that was rejected.
        weight: f32,
    },
    /// One or more seed supervoxels are not part of the body.
    #[error("seed supervoxels not in body: {}", format_ids(.supervoxels))]
    UnknownSeed {
        /// Every unknown seed, in ascending order.
        supervoxels: Vec<SupervoxelId>,
    },
    /// Fewer than two distinct seed labels were supplied.
    #[error("a cleave needs at least two seed groups (got {groups})")]
    InsufficientSeeds {
        /// Number of distinct labels supplied.
        groups: usize,
    },
    /// A supervoxel was given two different seed labels.
    #[error("supervoxel {supervoxel} is seeded as both {first} and {second}")]
    ConflictingSeed {
        /// Supervoxel carrying both labels.
        supervoxel: SupervoxelId,
        /// Label seen first.
        first: SeedLabel,
        /// Conflicting label seen later.
        second: SeedLabel,
    },
    /// Seeds sharing a label could not be joined without crossing another
    /// seed group's territory.
    #[error("seeds of label {label} could not be joined: {}", format_ids(.seeds))]
    SeedsUnreachableDistinct {
        /// Label whose seeds ended up in separate components.
        label: SeedLabel,
        /// Seeds of that label outside its primary group.
        seeds: Vec<SupervoxelId>,
    },
    /// The request was cancelled cooperatively.
    #[error("cleave cancelled during {stage}")]
    Cancelled {
        /// Stage that observed the cancellation.
        stage: &'static str,
    },
    /// The same body appeared twice in one batch.
    #[error("body {body} appears more than once in the batch")]
    DuplicateBody {
        /// Repeated body.
        body: BodyId,
    },
    /// Fetching the body graph failed.
    #[error("graph source failed for body {body}: {error}")]
    GraphSource {
        /// Body being fetched.
        body: BodyId,
        #[source]
        /// Underlying source error.
        error: GraphSourceError,
    },
}

define_error_codes! {
    /// Stable codes describing [`CleaveError`] variants.
    enum CleaveErrorCode for CleaveError {
        /// A builder parameter was outside its accepted range.
        InvalidConfiguration => InvalidConfiguration { .. } => "CLEAVE_INVALID_CONFIGURATION",
        /// The body has no supervoxels.
        EmptyBody => EmptyBody { .. } => "CLEAVE_EMPTY_BODY",
        /// The store returned edges inconsistent with body membership.
        InconsistentGraph => InconsistentGraph { .. } => "CLEAVE_INCONSISTENT_GRAPH",
        /// An edge weight was negative or non-finite.
        InvalidEdgeWeight => InvalidEdgeWeight { .. } => "CLEAVE_INVALID_EDGE_WEIGHT",
        /// A seed supervoxel is not in the body.
        UnknownSeed => UnknownSeed { .. } => "CLEAVE_UNKNOWN_SEED",
        /// Fewer than two seed groups.
        InsufficientSeeds => InsufficientSeeds { .. } => "CLEAVE_INSUFFICIENT_SEEDS",
        /// A supervoxel carries two labels.
        ConflictingSeed => ConflictingSeed { .. } => "CLEAVE_CONFLICTING_SEED",
        /// Seeds of one label could not be joined.
        SeedsUnreachableDistinct => SeedsUnreachableDistinct { .. } => "CLEAVE_SEEDS_UNREACHABLE_DISTINCT",
        /// The request was cancelled.
        Cancelled => Cancelled { .. } => "CLEAVE_CANCELLED",
        /// A batch named the same body twice.
        DuplicateBody => DuplicateBody { .. } => "CLEAVE_DUPLICATE_BODY",
        /// The graph source failed.
        GraphSourceFailure => GraphSource { .. } => "CLEAVE_GRAPH_SOURCE_FAILURE",
    }
}

impl CleaveError {
    /// Retrieve the inner [`GraphSourceErrorCode`] when the error originated in a
    /// [`crate::GraphSource`].
    #[must_use]
    pub const fn graph_source_code(&self) -> Option<GraphSourceErrorCode> {
        match self {
            Self::GraphSource { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    /// Returns `true` when retrying the same request later may succeed.
    ///
    /// Only store unavailability qualifies; the engine itself performs no I/O.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::GraphSource {
                error: GraphSourceError::StoreUnavailable { .. },
                ..
            }
        )
    }

    /// Returns `true` when the operator can fix the request by changing seeds.
    #[must_use]
    pub const fn is_operator_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownSeed { .. }
                | Self::InsufficientSeeds { .. }
                | Self::ConflictingSeed { .. }
                | Self::SeedsUnreachableDistinct { .. }
        )
    }
}

fn format_ids(ids: &[SupervoxelId]) -> String {
    let mut rendered = String::new();
    for (position, id) in ids.iter().enumerate() {
        if position > 0 {
            rendered.push_str(", ");
        }
        rendered.push_str(&id.to_string());
    }
    rendered
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, CleaveError>;
