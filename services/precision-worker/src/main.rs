use std::sync::Arc;

use calculation::MachinPi;
use clap::Parser;
use persistence::{RedisStore, connect_with_retry};
use precision_worker::{Advancer, WorkerArgs};
use tracing_subscriber::EnvFilter;
use types::keys::KeySpace;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = WorkerArgs::parse();
    let config = args.worker_config()?;

    tracing::info!(max_precision = config.max_precision, "Starting precision worker");

    let keys = KeySpace::new(&args.key_prefix);
    let store = connect_with_retry(config.connect_retry, || {
        RedisStore::connect(&args.redis_url, keys.clone())
    })
    .await?;

    let calculator = MachinPi::new(args.max_supported_precision);
    let advancer = Advancer::resume(Arc::new(store), Arc::new(calculator), config).await?;

    advancer.run().await;
    Ok(())
}
