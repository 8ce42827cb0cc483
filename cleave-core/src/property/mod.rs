//! Property-based tests for the cleave pipeline.
//!
//! Checks structural invariants (totality, connectivity, seed fidelity),
//! determinism under repetition and input reordering, greedy cut quality
//! against the agglomeration trace, and idempotence when a result is fed
//! back in as seeds. Bodies are generated across several shapes that stress
//! tie-breaking, fragmentation and the merge threshold.

mod cut_quality;
mod determinism;
mod helpers;
mod idempotence;
mod strategies;
mod structural;
mod types;
