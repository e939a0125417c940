//! HTTP gateway for the pi snapshot
//!
//! Serves the latest persisted `{pi, circumference}` pair as JSON and as a
//! server-sent event stream. Live streams are capped per session cookie by
//! the [`throttle::SessionThrottle`].
//!
//! ```text
//!   client ── GET /pi-stream ──► SessionThrottle ──► FanOut task ──► StateStore
//!          ◄── data: {...} ───────────── mpsc ◄──────────┘   ▲ notifications
//! ```

pub mod config;
pub mod embedded;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod session;
pub mod state;
pub mod throttle;

pub use config::{GatewayArgs, GatewayConfig};
pub use error::AppError;
pub use router::create_router;
pub use state::AppState;
