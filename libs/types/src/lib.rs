//! Types library for the incremental pi service
//!
//! This library provides the type definitions shared by the precision worker,
//! the persistence layer and the streaming gateway, so that every process
//! agrees on record shapes, key names and error taxonomy.
//!
//! # Modules
//! - `ids`: Opaque session tokens
//! - `numeric`: Arbitrary-precision fixed-point decimal
//! - `state`: Persisted pi state and the client-facing snapshot
//! - `keys`: Store key space and notification channel
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod state;
pub mod keys;
pub mod errors;

/// Solar radius in kilometres, the default constant for the circumference.
pub const SUN_RADIUS_KM: i64 = 696_340;

/// Default upper bound for the worker's precision target.
pub const DEFAULT_MAX_PRECISION: u32 = 100;

/// Default number of concurrent streams allowed per session.
pub const DEFAULT_SESSION_LIMIT: u32 = 3;
