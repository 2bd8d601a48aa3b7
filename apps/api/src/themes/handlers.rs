//! Axum route handlers for the steps entry point.

use axum::{extract::State, Json};

use crate::state::AppState;
use crate::themes::generator::{steps, StepsOutcome};

/// GET /api/v1/steps
///
/// Stored plans if any exist, otherwise generates (and saves) a fresh set.
pub async fn handle_get_steps(State(state): State<AppState>) -> Json<StepsOutcome> {
    Json(run_steps(&state, false).await)
}

/// POST /api/v1/steps/refresh
///
/// Always re-clusters the current high-priority reviews and replaces stored plans.
pub async fn handle_refresh_steps(State(state): State<AppState>) -> Json<StepsOutcome> {
    Json(run_steps(&state, true).await)
}

async fn run_steps(state: &AppState, refresh: bool) -> StepsOutcome {
    steps(
        state.store.as_ref(),
        state.oracle.as_deref(),
        state.references.as_ref(),
        state.config.call_delay(),
        refresh,
    )
    .await
}
