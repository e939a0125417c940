//! Opaque session tokens
//!
//! A session id is issued once per client and echoed back on every request.
//! The server never decodes it; it is only a map key for connection
//! throttling.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Client session token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Issue a fresh random token
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a token presented by a client. Empty tokens are refused.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tokens_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_from_token() {
        let id = SessionId::from_token("abc-123").unwrap();
        assert_eq!(id.as_str(), "abc-123");
        assert!(SessionId::from_token("   ").is_none());
    }
}
