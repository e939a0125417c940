//! Store key space and notification channel
//!
//! All keys share one prefix so several deployments can share a store.

use serde::{Deserialize, Serialize};

/// Payload published on the channel after every committed update.
pub const UPDATE_MARKER: &str = "UPDATE";

/// Default key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "pi";

/// Names of the three state keys and the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpace {
    pub pi: String,
    pub precision: String,
    pub circumference: String,
    pub channel: String,
}

impl KeySpace {
    pub fn new(prefix: &str) -> Self {
        Self {
            pi: format!("{}:current_value", prefix),
            precision: format!("{}:precision_level", prefix),
            circumference: format!("{}:circumference_value", prefix),
            channel: format!("{}:updates", prefix),
        }
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}
