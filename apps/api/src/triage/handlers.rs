//! Axum route handler for the process entry point.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::state::AppState;
use crate::triage::process::{process, ProcessDeps, ProcessOutcome, ProcessSettings};

#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    /// Overrides the configured `APP_ID`.
    pub app_id: Option<String>,
}

/// POST /api/v1/process
///
/// Fetch → triage → themes → plans, synchronously. Returns a structured
/// outcome even when a stage fails; `success=false` means nothing ran.
pub async fn handle_process(
    State(state): State<AppState>,
    request: Option<Json<ProcessRequest>>,
) -> Json<ProcessOutcome> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let deps = ProcessDeps {
        store: state.store.as_ref(),
        oracle: state.oracle.as_deref(),
        source: state.source.as_deref(),
        references: state.references.as_ref(),
    };
    let settings = ProcessSettings {
        app_id: request
            .app_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| state.config.app_id.clone()),
        days_to_scrape: state.config.days_to_scrape,
        max_reviews: state.config.max_reviews,
        call_delay: state.config.call_delay(),
    };

    Json(process(deps, &settings).await)
}
