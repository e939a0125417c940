//! Shared state store for the pi service
//!
//! The store is the single source of truth and the only channel between the
//! precision worker and the streaming gateway. It holds three scalar keys
//! (pi, precision level, circumference), writes them atomically together
//! with a change notification, and fans notifications out to any number of
//! subscribers.
//!
//! # Backends
//! - [`RedisStore`]: production backend (`MULTI`/`EXEC` pipeline + pub/sub)
//! - [`MemoryStore`]: single-process backend used by tests and local runs
//!
//! ```text
//!  Worker ──commit──▶ ┌─────────────┐ ──UPDATE──▶ Subscription (per stream)
//!                     │ StateStore  │
//!  Gateway ◀─load──── └─────────────┘
//! ```

pub mod store;
pub mod memory;
pub mod redis_store;
pub mod retry;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use retry::connect_with_retry;
pub use store::{StateStore, Subscription, WaitOutcome};
