use thiserror::Error;
use types::errors::StoreError;

/// Fatal worker errors. Everything transient is retried inside the loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
