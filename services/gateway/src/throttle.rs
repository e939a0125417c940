//! Per-session cap on concurrent live streams
//!
//! Counts live in a `DashMap` keyed by session; every check-and-increment
//! happens under the shard lock of that session's entry, so two concurrent
//! admissions can never both take the last slot. An entry exists only while
//! its count is positive.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;
use types::ids::SessionId;

pub struct SessionThrottle {
    limit: u32,
    live: DashMap<SessionId, u32>,
}

impl SessionThrottle {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            live: DashMap::new(),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Take one slot for `session` if it is below the limit.
    pub fn admit(&self, session: &SessionId) -> bool {
        if self.limit == 0 {
            return false;
        }

        let mut count = self.live.entry(session.clone()).or_insert(0);
        if *count >= self.limit {
            return false;
        }
        *count += 1;
        debug!(session = %session, live = *count, "Session slot taken");
        true
    }

    /// Give one slot back. Unknown sessions are ignored.
    pub fn release(&self, session: &SessionId) {
        if let Entry::Occupied(mut entry) = self.live.entry(session.clone()) {
            if *entry.get() <= 1 {
                entry.remove();
            } else {
                *entry.get_mut() -= 1;
            }
            debug!(session = %session, "Session slot released");
        }
    }

    /// Admit `session` and tie the slot to the returned guard.
    pub fn try_acquire(self: &Arc<Self>, session: &SessionId) -> Option<ThrottleSlot> {
        self.admit(session).then(|| ThrottleSlot {
            throttle: Arc::clone(self),
            session: session.clone(),
        })
    }

    /// Live streams currently held by `session`.
    pub fn live_count(&self, session: &SessionId) -> u32 {
        self.live.get(session).map(|count| *count).unwrap_or(0)
    }

    /// Sessions holding at least one slot.
    pub fn session_count(&self) -> usize {
        self.live.len()
    }
}

/// One admitted stream. Dropping it releases the slot.
pub struct ThrottleSlot {
    throttle: Arc<SessionThrottle>,
    session: SessionId,
}

impl ThrottleSlot {
    pub fn session(&self) -> &SessionId {
        &self.session
    }
}

impl Drop for ThrottleSlot {
    fn drop(&mut self) {
        self.throttle.release(&self.session);
    }
}
