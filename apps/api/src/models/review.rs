use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::store::StoreError;
use crate::triage::models::{AnnotatedReview, Category, Review, Sentiment, StageStatus};

#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
    pub review_id: String,
    pub app_id: String,
    pub author: String,
    pub review_text: String,
    pub rating: i16,
    pub collected_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub sentiment_done: bool,
    pub categories_done: bool,
    pub priority_done: bool,
}

/// `reviews` joined with sentiment, priority and the aggregated category labels.
#[derive(Debug, Clone, FromRow)]
pub struct AnnotatedReviewRow {
    #[sqlx(flatten)]
    pub review: ReviewRow,
    pub sentiment: Option<String>,
    pub priority_level: Option<i16>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SentimentRow {
    pub review_id: String,
    pub label: String,
    pub confidence: f64,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = u8::try_from(row.rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| StoreError::Corrupt {
                review_id: row.review_id.clone(),
                detail: format!("rating {} outside 1..=5", row.rating),
            })?;

        Ok(Review {
            review_id: row.review_id,
            app_id: row.app_id,
            author: row.author,
            text: row.review_text,
            rating,
            collected_at: row.collected_at,
            ingested_at: row.ingested_at,
            status: StageStatus {
                sentiment_done: row.sentiment_done,
                categories_done: row.categories_done,
                priority_done: row.priority_done,
            },
        })
    }
}

impl TryFrom<AnnotatedReviewRow> for AnnotatedReview {
    type Error = StoreError;

    fn try_from(row: AnnotatedReviewRow) -> Result<Self, Self::Error> {
        let review_id = row.review.review_id.clone();

        let sentiment = row
            .sentiment
            .as_deref()
            .map(|label| parse_sentiment(&review_id, label))
            .transpose()?;

        let priority = row
            .priority_level
            .map(|level| {
                u8::try_from(level).map_err(|_| StoreError::Corrupt {
                    review_id: review_id.clone(),
                    detail: format!("priority {level} out of range"),
                })
            })
            .transpose()?;

        let categories = row
            .categories
            .iter()
            .map(|label| parse_category(&review_id, label))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AnnotatedReview {
            review: row.review.try_into()?,
            sentiment,
            priority,
            categories,
        })
    }
}

pub fn parse_sentiment(review_id: &str, label: &str) -> Result<Sentiment, StoreError> {
    Sentiment::from_label(label).ok_or_else(|| StoreError::Corrupt {
        review_id: review_id.to_string(),
        detail: format!("unknown sentiment label '{label}'"),
    })
}

pub fn parse_category(review_id: &str, label: &str) -> Result<Category, StoreError> {
    Category::from_label(label).ok_or_else(|| StoreError::Corrupt {
        review_id: review_id.to_string(),
        detail: format!("unknown category label '{label}'"),
    })
}
