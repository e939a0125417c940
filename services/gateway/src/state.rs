use std::sync::Arc;

use persistence::StateStore;

use crate::config::GatewayConfig;
use crate::throttle::SessionThrottle;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub throttle: Arc<SessionThrottle>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn StateStore>, config: GatewayConfig) -> Self {
        Self {
            store,
            throttle: Arc::new(SessionThrottle::new(config.session_limit)),
            config: Arc::new(config),
        }
    }
}
