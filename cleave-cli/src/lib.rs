//! Support library for the `cleave` operator harness.
//!
//! Exposes the command pipeline and logging setup so tests can exercise a
//! cleave end to end without spawning the binary.

pub mod cli;
pub mod logging;
