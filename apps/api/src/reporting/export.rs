//! CSV export of recent reviews with their triage annotations.
//!
//! Theme column: the first of the newest stored plan titles that contains one
//! of the review's category names (case-insensitive). Plans are not linked to
//! reviews directly, so this is a best-effort match.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use tracing::info;

use crate::store::{ReviewStore, StoreError};
use crate::triage::models::{AnnotatedReview, Category};

pub const EXPORT_HEADERS: [&str; 8] = [
    "Reviewer Name",
    "Star Rating",
    "Sentiment",
    "Priority",
    "Categories",
    "Themes",
    "Review Text",
    "Date",
];

/// Plan titles considered for the theme column.
pub const THEME_TITLE_LIMIT: usize = 10;

const NOT_ANALYZED: &str = "Not analyzed";
const NOT_SET: &str = "Not set";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct CsvExport {
    pub filename: String,
    pub path: PathBuf,
    pub rows: usize,
    pub body: Vec<u8>,
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("reviews_export_{}.csv", date.format("%Y-%m-%d"))
}

pub fn match_theme<'a>(categories: &[Category], theme_titles: &'a [String]) -> Option<&'a str> {
    theme_titles
        .iter()
        .find(|title| {
            let title = title.to_lowercase();
            categories
                .iter()
                .any(|c| title.contains(&c.label().to_lowercase()))
        })
        .map(String::as_str)
}

pub fn render_csv(
    reviews: &[AnnotatedReview],
    theme_titles: &[String],
) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(EXPORT_HEADERS)?;

    for r in reviews {
        let categories = r
            .categories
            .iter()
            .map(Category::label)
            .collect::<Vec<_>>()
            .join(", ");

        writer.write_record([
            r.review.author.clone(),
            r.review.rating.to_string(),
            r.sentiment
                .map(|s| s.to_string())
                .unwrap_or_else(|| NOT_ANALYZED.to_string()),
            r.priority
                .map(|p| p.to_string())
                .unwrap_or_else(|| NOT_SET.to_string()),
            categories,
            match_theme(&r.categories, theme_titles)
                .unwrap_or_default()
                .to_string(),
            r.review.text.clone(),
            r.review.collected_at.to_rfc3339(),
        ])?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Writes the export for reviews ingested in the last `days` days into
/// `export_dir`. Returns `None` when the window is empty.
pub async fn export_reviews(
    store: &dyn ReviewStore,
    export_dir: &Path,
    days: u32,
    now: DateTime<Utc>,
) -> Result<Option<CsvExport>, ExportError> {
    let reviews = store
        .reviews_since(now - Duration::days(i64::from(days)))
        .await?;
    if reviews.is_empty() {
        info!("No reviews found for export");
        return Ok(None);
    }

    let theme_titles: Vec<String> = store
        .action_plans(THEME_TITLE_LIMIT)
        .await?
        .into_iter()
        .map(|p| p.plan.title)
        .collect();

    let body = render_csv(&reviews, &theme_titles)?;

    let filename = export_filename(now.date_naive());
    tokio::fs::create_dir_all(export_dir).await?;
    let path = export_dir.join(&filename);
    tokio::fs::write(&path, &body).await?;

    info!("Exported {} reviews to {}", reviews.len(), path.display());
    Ok(Some(CsvExport {
        filename,
        path,
        rows: reviews.len(),
        body,
    }))
}
