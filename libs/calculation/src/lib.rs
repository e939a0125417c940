//! Precision calculator
//!
//! The worker treats "compute pi to `precision` digits" as a black box that
//! may be slow and may fail. [`PrecisionCalculator`] is that contract;
//! [`MachinPi`] is the implementation the worker ships with.

pub mod machin;

pub use machin::MachinPi;

use types::errors::ComputeError;

/// Computes the target constant to a requested precision.
///
/// Implementations return a plain decimal literal with at least `precision`
/// fractional digits, all of them correct except possibly for rounding in the
/// digits beyond `precision`. `compute(0)` returns the integer part.
///
/// Calls are CPU bound and run on a blocking thread.
pub trait PrecisionCalculator: Send + Sync + 'static {
    fn compute(&self, precision: u32) -> Result<String, ComputeError>;
}
