//! Benchmark support crate for the cleave engine.
//!
//! Provides seeded synthetic bodies and parameter types used by the Criterion
//! benchmarks that track cleave latency against the interactive target.

pub mod error;
pub mod params;
pub mod source;
