//! Axum route handlers for the report, reviews and export entry points.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::reporting::export::export_reviews;
use crate::reporting::report::{build_report, Report};
use crate::state::AppState;
use crate::triage::models::AnnotatedReview;

pub const DEFAULT_DAYS: u32 = 7;
pub const MAX_DAYS: u32 = 365;
pub const DEFAULT_REVIEW_LIMIT: usize = 5;
pub const MAX_REVIEW_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<u32>,
}

impl WindowQuery {
    fn days(&self) -> Result<u32, AppError> {
        match self.days.unwrap_or(DEFAULT_DAYS) {
            0 => Err(AppError::Validation("days must be at least 1".to_string())),
            d if d > MAX_DAYS => Err(AppError::Validation(format!(
                "days cannot exceed {MAX_DAYS}"
            ))),
            d => Ok(d),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub reviews: Vec<AnnotatedReview>,
}

/// GET /api/v1/report?days=7
pub async fn handle_report(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Report>, AppError> {
    let days = query.days()?;
    let since = Utc::now() - Duration::days(i64::from(days));
    let reviews = state.store.reviews_since(since).await?;
    Ok(Json(build_report(&reviews, days)))
}

/// GET /api/v1/reviews?limit=5
///
/// Most recently ingested reviews with their annotations. The limit is capped at 10.
pub async fn handle_recent_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<ReviewsResponse>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_REVIEW_LIMIT)
        .clamp(1, MAX_REVIEW_LIMIT);
    let reviews = state.store.recent_reviews(limit).await?;
    Ok(Json(ReviewsResponse { reviews }))
}

/// GET /api/v1/export?days=7
///
/// Writes the CSV into the export directory and returns it as the response body.
pub async fn handle_export(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AppError> {
    let days = query.days()?;
    let export = export_reviews(
        state.store.as_ref(),
        &state.config.export_dir,
        days,
        Utc::now(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No reviews found in the past {days} days")))?;

    info!(
        "Serving export {} ({} rows)",
        export.path.display(),
        export.rows
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.body,
    ))
}
