//! In-process store backend
//!
//! Mirrors the Redis key layout in a map guarded by one lock, so a commit is
//! atomic with respect to readers. Notifications go through a tokio
//! broadcast channel; a receiver that lags behind collapses the missed
//! notifications into a single `Changed`.
//!
//! Fault injection (`set_unavailable`, `fail_next_commits`,
//! `drop_subscribers`) lets tests drive the retry paths of the worker and the
//! teardown paths of the gateway.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use types::errors::StoreError;
use types::keys::{KeySpace, UPDATE_MARKER};
use types::state::PiState;

use crate::store::{assemble_state, parse_precision, StateStore, Subscription, WaitOutcome};

/// Buffered notifications per subscriber before lag kicks in.
const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct Inner {
    values: BTreeMap<String, String>,
    /// Precision of every successful commit, in order.
    committed: Vec<u32>,
}

pub struct MemoryStore {
    keys: KeySpace,
    inner: RwLock<Inner>,
    updates: Mutex<broadcast::Sender<String>>,
    unavailable: AtomicBool,
    failing_commits: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_keys(KeySpace::default())
    }

    pub fn with_keys(keys: KeySpace) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            keys,
            inner: RwLock::new(Inner::default()),
            updates: Mutex::new(sender),
            unavailable: AtomicBool::new(false),
            failing_commits: AtomicU32::new(0),
        }
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Overwrite a raw key, bypassing the atomic commit path.
    pub async fn set_raw(&self, key: &str, value: &str) {
        self.inner
            .write()
            .await
            .values
            .insert(key.to_string(), value.to_string());
    }

    /// Make every operation fail with `Unavailable` until cleared.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Reject the next `count` commits with `Unavailable`.
    pub fn fail_next_commits(&self, count: u32) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Precision levels of all successful commits, oldest first.
    pub async fn committed_levels(&self) -> Vec<u32> {
        self.inner.read().await.committed.clone()
    }

    /// Number of open subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        self.updates.lock().await.receiver_count()
    }

    /// Close every open subscription, as a lost store connection would.
    pub async fn drop_subscribers(&self) {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let previous = std::mem::replace(&mut *self.updates.lock().await, sender);
        drop(previous);
        debug!("Dropped all memory store subscribers");
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn take_injected_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn load_precision(&self) -> Result<Option<u32>, StoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        inner
            .values
            .get(&self.keys.precision)
            .map(|raw| parse_precision(&self.keys.precision, raw))
            .transpose()
    }

    async fn load_state(&self) -> Result<Option<PiState>, StoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let get = |key: &String| inner.values.get(key).cloned();
        assemble_state(
            &self.keys,
            get(&self.keys.pi),
            get(&self.keys.precision),
            get(&self.keys.circumference),
        )
    }

    async fn commit(&self, state: &PiState) -> Result<(), StoreError> {
        self.check_available()?;
        if self.take_injected_failure() {
            return Err(StoreError::Unavailable("injected commit failure".to_string()));
        }

        {
            let mut inner = self.inner.write().await;
            inner.values.insert(self.keys.pi.clone(), state.pi.clone());
            inner
                .values
                .insert(self.keys.precision.clone(), state.precision.to_string());
            inner
                .values
                .insert(self.keys.circumference.clone(), state.circumference.clone());
            inner.committed.push(state.precision);
        }

        // No receivers is not an error, same as PUBLISH returning 0.
        let _ = self.updates.lock().await.send(UPDATE_MARKER.to_string());
        Ok(())
    }

    async fn subscribe(&self) -> Result<Box<dyn Subscription>, StoreError> {
        self.check_available()?;
        let receiver = self.updates.lock().await.subscribe();
        Ok(Box::new(MemorySubscription {
            receiver: Some(receiver),
        }))
    }
}

pub struct MemorySubscription {
    receiver: Option<broadcast::Receiver<String>>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn wait(&mut self, timeout: Duration) -> Result<WaitOutcome, StoreError> {
        let receiver = self.receiver.as_mut().ok_or(StoreError::SubscriptionClosed)?;
        let deadline = Instant::now() + timeout;

        loop {
            match tokio::time::timeout_at(deadline, receiver.recv()).await {
                Err(_) => return Ok(WaitOutcome::TimedOut),
                Ok(Ok(payload)) if payload == UPDATE_MARKER => return Ok(WaitOutcome::Changed),
                Ok(Ok(payload)) => {
                    debug!(payload, "Ignoring unexpected notification payload");
                }
                Ok(Err(broadcast::error::RecvError::Lagged(missed))) => {
                    debug!(missed, "Subscriber lagged, coalescing notifications");
                    return Ok(WaitOutcome::Changed);
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(StoreError::SubscriptionClosed);
                }
            }
        }
    }

    async fn close(&mut self) {
        self.receiver = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(precision: u32) -> PiState {
        PiState {
            pi: format!("3.{}", "1".repeat(precision as usize)),
            precision,
            circumference: "4375233".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryStore::new();
        assert_eq!(store.load_precision().await.unwrap(), None);
        assert_eq!(store.load_state().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_is_visible() {
        let store = MemoryStore::new();
        store.commit(&state(2)).await.unwrap();

        assert_eq!(store.load_precision().await.unwrap(), Some(2));
        assert_eq!(store.load_state().await.unwrap(), Some(state(2)));
        assert_eq!(store.committed_levels().await, vec![2]);
    }

    #[tokio::test]
    async fn test_subscriber_is_notified() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();

        store.commit(&state(1)).await.unwrap();
        let outcome = sub.wait(Duration::from_millis(100)).await.unwrap();
        assert_eq!(outcome, WaitOutcome::Changed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();

        let outcome = sub.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_coalesces() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();

        for precision in 1..=(CHANNEL_CAPACITY as u32 + 5) {
            store.commit(&state(precision)).await.unwrap();
        }

        assert_eq!(
            sub.wait(Duration::from_millis(50)).await.unwrap(),
            WaitOutcome::Changed
        );
    }

    #[tokio::test]
    async fn test_injected_commit_failure() {
        let store = MemoryStore::new();
        store.fail_next_commits(1);

        let err = store.commit(&state(1)).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.load_state().await.unwrap(), None);

        store.commit(&state(1)).await.unwrap();
        assert_eq!(store.committed_levels().await, vec![1]);
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(store.ping().await.unwrap_err().is_transient());
        assert!(store.subscribe().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_precision() {
        let store = MemoryStore::new();
        let key = store.keys().precision.clone();
        store.set_raw(&key, "seven").await;

        let err = store.load_precision().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_dropped_subscribers_see_closed() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();
        assert_eq!(store.subscriber_count().await, 1);

        store.drop_subscribers().await;
        assert_eq!(
            sub.wait(Duration::from_millis(50)).await.unwrap_err(),
            StoreError::SubscriptionClosed
        );
        assert_eq!(store.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_unsubscribes() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe().await.unwrap();
        sub.close().await;

        assert_eq!(store.subscriber_count().await, 0);
        assert_eq!(
            sub.wait(Duration::from_millis(10)).await.unwrap_err(),
            StoreError::SubscriptionClosed
        );
    }
}
