use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::plan::ActionPlanRow;
use crate::models::review::{
    parse_category, parse_sentiment, AnnotatedReviewRow, ReviewRow, SentimentRow,
};
use crate::store::{ReviewStore, StoreError};
use crate::themes::models::{ActionPlan, StoredActionPlan};
use crate::triage::categorize::CategoryResult;
use crate::triage::models::{AnnotatedReview, Category, NewReview, Review, SentimentRecord};
use crate::triage::pipeline::PriorityResult;
use crate::triage::sentiment::SentimentResult;

/// Base SELECT for a review joined with its annotations. Callers append WHERE/ORDER/LIMIT.
const ANNOTATED_SELECT: &str = r#"
    SELECT r.review_id, r.app_id, r.author, r.review_text, r.rating,
           r.collected_at, r.ingested_at,
           r.sentiment_done, r.categories_done, r.priority_done,
           s.label AS sentiment,
           p.level AS priority_level,
           ARRAY(
               SELECT c.label FROM categories c
               WHERE c.review_id = r.review_id
               ORDER BY c.id
           ) AS categories
    FROM reviews r
"#;

#[derive(Clone)]
pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn annotate(rows: Vec<AnnotatedReviewRow>) -> Result<Vec<AnnotatedReview>, StoreError> {
    rows.into_iter().map(AnnotatedReview::try_from).collect()
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn insert_review(&self, review: &NewReview) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reviews (review_id, app_id, author, review_text, rating, collected_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (review_id) DO NOTHING
            "#,
        )
        .bind(&review.review_id)
        .bind(&review.app_id)
        .bind(&review.author)
        .bind(&review.text)
        .bind(review.rating as i16)
        .bind(review.collected_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn pending_reviews(&self) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            r#"
            SELECT review_id, app_id, author, review_text, rating, collected_at, ingested_at,
                   sentiment_done, categories_done, priority_done
            FROM reviews
            WHERE NOT (sentiment_done AND categories_done AND priority_done)
            ORDER BY ingested_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn save_sentiments(&self, results: &[SentimentResult]) -> Result<usize, StoreError> {
        if results.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for result in results {
            sqlx::query(
                r#"
                INSERT INTO sentiment (review_id, label, confidence)
                VALUES ($1, $2, $3)
                ON CONFLICT (review_id)
                DO UPDATE SET label = EXCLUDED.label, confidence = EXCLUDED.confidence
                "#,
            )
            .bind(&result.review_id)
            .bind(result.sentiment.as_str())
            .bind(result.confidence)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE reviews SET sentiment_done = TRUE WHERE review_id = $1")
                .bind(&result.review_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(results.len())
    }

    async fn replace_categories(&self, results: &[CategoryResult]) -> Result<usize, StoreError> {
        if results.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for result in results {
            sqlx::query("DELETE FROM categories WHERE review_id = $1")
                .bind(&result.review_id)
                .execute(&mut *tx)
                .await?;

            for category in &result.categories {
                sqlx::query("INSERT INTO categories (review_id, label) VALUES ($1, $2)")
                    .bind(&result.review_id)
                    .bind(category.label())
                    .execute(&mut *tx)
                    .await?;
                written += 1;
            }

            sqlx::query("UPDATE reviews SET categories_done = TRUE WHERE review_id = $1")
                .bind(&result.review_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn save_priorities(&self, results: &[PriorityResult]) -> Result<usize, StoreError> {
        if results.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for result in results {
            sqlx::query(
                r#"
                INSERT INTO priorities (review_id, level)
                VALUES ($1, $2)
                ON CONFLICT (review_id) DO UPDATE SET level = EXCLUDED.level
                "#,
            )
            .bind(&result.review_id)
            .bind(result.priority as i16)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE reviews SET priority_done = TRUE WHERE review_id = $1")
                .bind(&result.review_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(results.len())
    }

    async fn sentiment_for(&self, review_id: &str) -> Result<Option<SentimentRecord>, StoreError> {
        let row: Option<SentimentRow> = sqlx::query_as(
            "SELECT review_id, label, confidence FROM sentiment WHERE review_id = $1",
        )
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(SentimentRecord {
                sentiment: parse_sentiment(&r.review_id, &r.label)?,
                confidence: r.confidence,
            })
        })
        .transpose()
    }

    async fn categories_for(&self, review_id: &str) -> Result<Vec<Category>, StoreError> {
        let labels: Vec<String> =
            sqlx::query_scalar("SELECT label FROM categories WHERE review_id = $1 ORDER BY id")
                .bind(review_id)
                .fetch_all(&self.pool)
                .await?;

        labels
            .iter()
            .map(|label| parse_category(review_id, label))
            .collect()
    }

    async fn high_priority_reviews(
        &self,
        limit: usize,
    ) -> Result<Vec<AnnotatedReview>, StoreError> {
        let sql = format!(
            r#"{ANNOTATED_SELECT}
            JOIN priorities p ON p.review_id = r.review_id
            JOIN sentiment s ON s.review_id = r.review_id
            WHERE p.level <= 2 AND s.label IN ('Negative', 'Neutral')
            ORDER BY p.level ASC, r.ingested_at DESC, r.collected_at DESC
            LIMIT $1"#
        );

        let rows: Vec<AnnotatedReviewRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        annotate(rows)
    }

    async fn recent_reviews(&self, limit: usize) -> Result<Vec<AnnotatedReview>, StoreError> {
        let sql = format!(
            r#"{ANNOTATED_SELECT}
            LEFT JOIN sentiment s ON s.review_id = r.review_id
            LEFT JOIN priorities p ON p.review_id = r.review_id
            ORDER BY r.ingested_at DESC, r.id DESC
            LIMIT $1"#
        );

        let rows: Vec<AnnotatedReviewRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        annotate(rows)
    }

    async fn reviews_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnnotatedReview>, StoreError> {
        let sql = format!(
            r#"{ANNOTATED_SELECT}
            LEFT JOIN sentiment s ON s.review_id = r.review_id
            LEFT JOIN priorities p ON p.review_id = r.review_id
            WHERE r.ingested_at >= $1
            ORDER BY r.ingested_at DESC, r.id DESC"#
        );

        let rows: Vec<AnnotatedReviewRow> = sqlx::query_as(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;

        annotate(rows)
    }

    async fn replace_action_plans(&self, plans: &[ActionPlan]) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM action_plans")
            .execute(&mut *tx)
            .await?;

        for (position, plan) in plans.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO action_plans
                    (id, position, title, summary, steps_json, response_text,
                     member_count, review_samples)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(position as i32)
            .bind(&plan.title)
            .bind(&plan.summary)
            .bind(serde_json::to_value(&plan.action_steps)?)
            .bind(&plan.user_response)
            .bind(plan.review_count as i32)
            .bind(serde_json::to_value(&plan.review_samples)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Saved {} action plans", plans.len());
        Ok(plans.len())
    }

    async fn action_plans(&self, limit: usize) -> Result<Vec<StoredActionPlan>, StoreError> {
        let rows: Vec<ActionPlanRow> = sqlx::query_as(
            r#"
            SELECT id, title, summary, steps_json, response_text,
                   member_count, review_samples, created_at
            FROM action_plans
            ORDER BY created_at DESC, position ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredActionPlan::try_from).collect()
    }
}
