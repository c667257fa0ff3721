//! Ground Elapsed Time (GET) utilities and the fixed-rate simulation clock.
//!
//! GET is the single time axis the kernel runs on: a nonnegative duration in
//! seconds since mission start, represented as `f64`. Every other subsystem
//! compares and stamps against GET rather than wall-clock time.

mod clock;
mod get;

pub use clock::SimulationClock;
pub use get::{format_get, parse_get, GetParseError};

/// Tolerance used throughout the kernel for GET/float comparisons.
pub const EPSILON: f64 = 1e-6;
