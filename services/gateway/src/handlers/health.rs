use axum::{Json, extract::State};
use tracing::warn;

use crate::error::AppError;
use crate::models::HealthResponse;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.ping().await.map_err(|err| {
        warn!(error = %err, "Health check failed");
        AppError::ServiceUnavailable("State store is unreachable".to_string())
    })?;

    Ok(Json(HealthResponse { status: "ok" }))
}
