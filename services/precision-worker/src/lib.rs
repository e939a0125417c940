//! Precision worker
//!
//! Single-instance loop that raises the precision of the persisted pi value
//! by one digit per successful cycle:
//!
//! 1. resume from the last persisted precision level
//! 2. compute pi at `level + 1` (blocking pool) and derive the circumference
//! 3. commit both values and the change notification atomically
//! 4. on failure roll the level back and retry the same level after a delay
//!
//! Because a failed step is always re-derived from the last confirmed level,
//! the persisted precision is contiguous: no level is ever skipped.

pub mod advancer;
pub mod config;
pub mod error;

pub use advancer::{Advancer, CycleOutcome};
pub use config::{WorkerArgs, WorkerConfig};
pub use error::WorkerError;
