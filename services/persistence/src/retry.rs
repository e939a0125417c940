//! Startup connection policy
//!
//! Connecting to the store is retried forever with a fixed delay as long as
//! the failure is a connectivity fault. Any other failure (bad URL, refused
//! command) is returned to the caller.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use types::errors::StoreError;

pub async fn connect_with_retry<T, F, Fut>(delay: Duration, mut connect: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match connect().await {
            Ok(connection) => return Ok(connection),
            Err(err) if err.is_transient() => {
                warn!(
                    attempt,
                    error = %err,
                    retry_in_secs = delay.as_secs_f64(),
                    "Store connection failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
