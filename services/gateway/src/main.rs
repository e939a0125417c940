use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gateway::{AppState, GatewayArgs, create_router, embedded};
use persistence::{MemoryStore, RedisStore, StateStore, connect_with_retry};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use types::keys::KeySpace;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Gateway API service");

    let args = GatewayArgs::parse();
    let config = args.gateway_config()?;
    let keys = KeySpace::new(&args.key_prefix);

    let store: Arc<dyn StateStore> = if args.memory_store {
        tracing::warn!("Using the in-memory store, state is lost on restart");
        let worker_config = args.worker_config()?;
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::with_keys(keys));
        embedded::spawn_worker(Arc::clone(&store), worker_config).await?;
        store
    } else {
        let retry = Duration::from_secs(args.connect_retry_secs);
        Arc::new(connect_with_retry(retry, || RedisStore::connect(&args.redis_url, keys.clone())).await?)
    };

    let state = AppState::new(store, config);
    let app = create_router(state);

    let listener = TcpListener::bind(args.bind).await?;

    tracing::info!("Listening on {}", args.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
