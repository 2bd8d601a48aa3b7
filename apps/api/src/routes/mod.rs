pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::reporting::handlers as reporting;
use crate::state::AppState;
use crate::themes::handlers as themes;
use crate::triage::handlers as triage;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Triage
        .route("/api/v1/process", post(triage::handle_process))
        // Themes and action plans
        .route("/api/v1/steps", get(themes::handle_get_steps))
        .route("/api/v1/steps/refresh", post(themes::handle_refresh_steps))
        // Read-only views
        .route("/api/v1/report", get(reporting::handle_report))
        .route("/api/v1/reviews", get(reporting::handle_recent_reviews))
        .route("/api/v1/export", get(reporting::handle_export))
        .with_state(state)
}
