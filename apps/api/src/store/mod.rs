//! Review store: relational persistence for reviews and everything derived from them.
//!
//! `AppState` holds an `Arc<dyn ReviewStore>`. Production uses `PgReviewStore`;
//! tests use the in-memory `MemoryStore`.
//!
//! Every write method that takes a batch runs as ONE transaction: either the
//! whole stage lands (rows + per-stage completion flags) or nothing does.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::themes::models::{ActionPlan, StoredActionPlan};
use crate::triage::categorize::CategoryResult;
use crate::triage::models::{AnnotatedReview, Category, NewReview, Review, SentimentRecord};
use crate::triage::pipeline::PriorityResult;
use crate::triage::sentiment::SentimentResult;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgReviewStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt row for review {review_id}: {detail}")]
    Corrupt { review_id: String, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(test)]
    #[error("Injected failure: {0}")]
    Injected(String),
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert-or-ignore keyed on the source review id. Returns true when a row was created.
    async fn insert_review(&self, review: &NewReview) -> Result<bool, StoreError>;

    /// Reviews with at least one triage stage outstanding, oldest ingestion first.
    async fn pending_reviews(&self) -> Result<Vec<Review>, StoreError>;

    /// Upserts sentiment records and marks the sentiment stage done.
    async fn save_sentiments(&self, results: &[SentimentResult]) -> Result<usize, StoreError>;

    /// Replaces (delete-then-insert) each review's categories and marks the stage done.
    /// Returns the number of category rows written.
    async fn replace_categories(&self, results: &[CategoryResult]) -> Result<usize, StoreError>;

    /// Upserts priorities and marks the priority stage done.
    async fn save_priorities(&self, results: &[PriorityResult]) -> Result<usize, StoreError>;

    async fn sentiment_for(&self, review_id: &str) -> Result<Option<SentimentRecord>, StoreError>;

    async fn categories_for(&self, review_id: &str) -> Result<Vec<Category>, StoreError>;

    /// Priority ≤ 2 with Negative/Neutral sentiment, most urgent then most recent first.
    async fn high_priority_reviews(&self, limit: usize)
        -> Result<Vec<AnnotatedReview>, StoreError>;

    /// Newest ingested reviews with their annotations.
    async fn recent_reviews(&self, limit: usize) -> Result<Vec<AnnotatedReview>, StoreError>;

    /// Every review ingested at or after `since`, newest first.
    async fn reviews_since(&self, since: DateTime<Utc>)
        -> Result<Vec<AnnotatedReview>, StoreError>;

    /// Deletes every stored plan and inserts `plans` in order.
    async fn replace_action_plans(&self, plans: &[ActionPlan]) -> Result<usize, StoreError>;

    /// Most recently generated plans, in generation order.
    async fn action_plans(&self, limit: usize) -> Result<Vec<StoredActionPlan>, StoreError>;
}
