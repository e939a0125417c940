//! Store contract
//!
//! Key-value reads for the three state keys, an all-or-nothing commit that
//! also publishes the change notification, and per-subscriber notification
//! handles with a bounded wait.

use std::time::Duration;

use async_trait::async_trait;
use types::errors::StoreError;
use types::keys::KeySpace;
use types::state::PiState;

// ── Notifications ───────────────────────────────────────────────────

/// Result of waiting on a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one change notification arrived. Several notifications that
    /// arrived while the subscriber was busy collapse into one.
    Changed,
    /// The wait deadline passed without a notification.
    TimedOut,
}

/// A live subscription to the change channel.
#[async_trait]
pub trait Subscription: Send {
    /// Wait up to `timeout` for the next change notification.
    ///
    /// Any error is terminal for this subscription.
    async fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, StoreError>;

    /// Unsubscribe. Later waits fail with `SubscriptionClosed`.
    async fn close(&mut self);
}

// ── Store ───────────────────────────────────────────────────────────

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Round-trip check used for startup and heartbeats.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Last persisted precision level, `None` before the first commit.
    async fn load_precision(&self) -> Result<Option<u32>, StoreError>;

    /// Last persisted state, `None` before the first commit.
    async fn load_state(&self) -> Result<Option<PiState>, StoreError>;

    /// Write pi, precision and circumference and publish the change
    /// notification as one atomic operation. On error nothing is visible.
    async fn commit(&self, state: &PiState) -> Result<(), StoreError>;

    /// Open a subscription to the change channel.
    async fn subscribe(&self) -> Result<Box<dyn Subscription>, StoreError>;
}

// ── Decoding helpers shared by the backends ─────────────────────────

pub(crate) fn parse_precision(key: &str, raw: &str) -> Result<u32, StoreError> {
    raw.trim().parse::<u32>().map_err(|_| StoreError::Corrupt {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Build a state from the three raw values read in one round trip.
pub(crate) fn assemble_state(
    keys: &KeySpace,
    pi: Option<String>,
    precision: Option<String>,
    circumference: Option<String>,
) -> Result<Option<PiState>, StoreError> {
    match (pi, precision, circumference) {
        (None, None, None) => Ok(None),
        (Some(pi), Some(precision), Some(circumference)) => Ok(Some(PiState {
            pi,
            precision: parse_precision(&keys.precision, &precision)?,
            circumference,
        })),
        (pi, precision, circumference) => Err(StoreError::Corrupt {
            key: keys.pi.clone(),
            value: format!(
                "partial state: pi={:?} precision={:?} circumference={:?}",
                pi, precision, circumference
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_precision() {
        assert_eq!(parse_precision("k", "42").unwrap(), 42);
        assert_eq!(parse_precision("k", " 7 ").unwrap(), 7);
        assert!(matches!(
            parse_precision("k", "-1"),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_assemble_state() {
        let keys = KeySpace::default();
        assert_eq!(assemble_state(&keys, None, None, None).unwrap(), None);

        let state = assemble_state(
            &keys,
            Some("3.14".into()),
            Some("2".into()),
            Some("4375233.26".into()),
        )
        .unwrap()
        .unwrap();
        assert_eq!(state.precision, 2);

        let partial = assemble_state(&keys, Some("3.14".into()), None, None);
        assert!(matches!(partial, Err(StoreError::Corrupt { .. })));
    }
}
