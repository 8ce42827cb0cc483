//! Benchmark setup error type.
//!
//! Lets setup code propagate failures with `?` instead of `.expect()`.

use cleave_core::CleaveError;

use crate::source::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic body generation failed.
    #[error("synthetic body generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Building or running a cleave failed.
    #[error("cleave failed: {0}")]
    Cleave(#[from] CleaveError),
}
