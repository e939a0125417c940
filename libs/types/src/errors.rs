//! Error types shared across the service
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Errors raised by the shared state store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store could not be reached. Always transient.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store answered but refused the command or transaction.
    #[error("Store rejected command: {0}")]
    Rejected(String),

    /// A persisted value could not be interpreted.
    #[error("Corrupt value for key {key}: {value}")]
    Corrupt { key: String, value: String },

    /// The notification subscription ended.
    #[error("Subscription closed")]
    SubscriptionClosed,
}

impl StoreError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Errors raised by the precision calculation step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("Calculation failed at precision {precision}: {reason}")]
    Failed { precision: u32, reason: String },

    #[error("Precision {requested} exceeds supported maximum {max}")]
    PrecisionTooLarge { requested: u32, max: u32 },

    #[error("Calculation panicked: {0}")]
    Panicked(String),

    #[error("Calculator returned {output:?} for precision {precision}")]
    InvalidOutput { precision: u32, output: String },

    #[error("Numeric error: {0}")]
    Numeric(#[from] NumericError),
}

/// Fixed-point arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("Invalid decimal literal: {0:?}")]
    Invalid(String),
}
