//! In-process precision worker for `--memory-store` deployments
//!
//! The in-memory store lives inside the gateway, so the worker that feeds it
//! has to run in the same process.

use std::sync::Arc;

use calculation::MachinPi;
use persistence::StateStore;
use precision_worker::{Advancer, WorkerConfig, WorkerError};
use tokio::task::JoinHandle;
use tracing::info;

/// Resume from whatever `store` holds and advance in a background task.
pub async fn spawn_worker(
    store: Arc<dyn StateStore>,
    config: WorkerConfig,
) -> Result<JoinHandle<()>, WorkerError> {
    let max_precision = config.max_precision;
    let advancer = Advancer::resume(store, Arc::new(MachinPi::default()), config).await?;
    info!(
        precision = advancer.current_precision(),
        max_precision, "Embedded precision worker started"
    );
    Ok(tokio::spawn(advancer.run()))
}
