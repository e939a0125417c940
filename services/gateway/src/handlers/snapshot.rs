use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use types::state::PiSnapshot;

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;

/// Current snapshot, or the placeholder before the worker's first commit.
pub async fn read_snapshot(state: &AppState) -> Result<PiSnapshot, AppError> {
    let stored = state.store.load_state().await?;
    Ok(PiSnapshot::from_stored(stored.as_ref(), &state.config.radius))
}

pub async fn get_status(State(state): State<AppState>, session: Session) -> Response {
    let result = read_snapshot(&state).await.map(Json);
    session.attach(result.into_response())
}
