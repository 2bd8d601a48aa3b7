//! In-memory `ReviewStore` with the same semantics as the Postgres store.
//! Writes can be made to fail per stage to exercise rollback paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::{ReviewStore, StoreError};
use crate::themes::models::{ActionPlan, StoredActionPlan};
use crate::triage::categorize::CategoryResult;
use crate::triage::models::{
    AnnotatedReview, Category, NewReview, Review, SentimentRecord, Sentiment, StageStatus,
    TriageStage,
};
use crate::triage::pipeline::PriorityResult;
use crate::triage::sentiment::SentimentResult;

#[derive(Default)]
struct Inner {
    reviews: Vec<Review>,
    sentiment: HashMap<String, SentimentRecord>,
    categories: HashMap<String, Vec<Category>>,
    priorities: HashMap<String, u8>,
    plans: Vec<StoredActionPlan>,
}

impl Inner {
    fn annotate(&self, review: &Review) -> AnnotatedReview {
        AnnotatedReview {
            review: review.clone(),
            sentiment: self.sentiment.get(&review.review_id).map(|s| s.sentiment),
            priority: self.priorities.get(&review.review_id).copied(),
            categories: self
                .categories
                .get(&review.review_id)
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn mark(&mut self, review_id: &str, stage: TriageStage) {
        if let Some(review) = self.reviews.iter_mut().find(|r| r.review_id == review_id) {
            review.status.mark(stage);
        }
    }

    /// Newest ingestion first; insertion order breaks ties.
    fn newest_first(&self) -> Vec<&Review> {
        let mut indexed: Vec<(usize, &Review)> = self.reviews.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| b.ingested_at.cmp(&a.ingested_at).then(ib.cmp(ia)));
        indexed.into_iter().map(|(_, r)| r).collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the named write (`"sentiment"`, `"categories"`, `"priorities"`, `"plans"`) fail.
    pub fn fail_writes(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Inserts a review with an explicit ingestion time.
    pub fn seed(&self, review: NewReview, ingested_at: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        inner.reviews.push(Review {
            review_id: review.review_id,
            app_id: review.app_id,
            author: review.author,
            text: review.text,
            rating: review.rating,
            collected_at: review.collected_at,
            ingested_at,
            status: StageStatus::default(),
        });
    }

    pub fn review(&self, review_id: &str) -> Option<Review> {
        let inner = self.inner.lock().unwrap();
        inner.reviews.iter().find(|r| r.review_id == review_id).cloned()
    }

    pub fn priority(&self, review_id: &str) -> Option<u8> {
        self.inner.lock().unwrap().priorities.get(review_id).copied()
    }

    pub fn sentiment(&self, review_id: &str) -> Option<Sentiment> {
        let inner = self.inner.lock().unwrap();
        inner.sentiment.get(review_id).map(|s| s.sentiment)
    }

    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(StoreError::Injected(operation.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: &NewReview) -> Result<bool, StoreError> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.reviews.iter().any(|r| r.review_id == review.review_id) {
                return Ok(false);
            }
        }
        self.seed(review.clone(), Utc::now());
        Ok(true)
    }

    async fn pending_reviews(&self) -> Result<Vec<Review>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<Review> = inner
            .reviews
            .iter()
            .filter(|r| !r.status.is_complete())
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.ingested_at);
        Ok(pending)
    }

    async fn save_sentiments(&self, results: &[SentimentResult]) -> Result<usize, StoreError> {
        self.check("sentiment")?;
        let mut inner = self.inner.lock().unwrap();
        for result in results {
            inner.sentiment.insert(
                result.review_id.clone(),
                SentimentRecord {
                    sentiment: result.sentiment,
                    confidence: result.confidence,
                },
            );
            inner.mark(&result.review_id, TriageStage::Sentiment);
        }
        Ok(results.len())
    }

    async fn replace_categories(&self, results: &[CategoryResult]) -> Result<usize, StoreError> {
        self.check("categories")?;
        let mut inner = self.inner.lock().unwrap();
        let mut written = 0;
        for result in results {
            inner
                .categories
                .insert(result.review_id.clone(), result.categories.clone());
            written += result.categories.len();
            inner.mark(&result.review_id, TriageStage::Categories);
        }
        Ok(written)
    }

    async fn save_priorities(&self, results: &[PriorityResult]) -> Result<usize, StoreError> {
        self.check("priorities")?;
        let mut inner = self.inner.lock().unwrap();
        for result in results {
            inner
                .priorities
                .insert(result.review_id.clone(), result.priority);
            inner.mark(&result.review_id, TriageStage::Priority);
        }
        Ok(results.len())
    }

    async fn sentiment_for(&self, review_id: &str) -> Result<Option<SentimentRecord>, StoreError> {
        Ok(self.inner.lock().unwrap().sentiment.get(review_id).copied())
    }

    async fn categories_for(&self, review_id: &str) -> Result<Vec<Category>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.categories.get(review_id).cloned().unwrap_or_default())
    }

    async fn high_priority_reviews(
        &self,
        limit: usize,
    ) -> Result<Vec<AnnotatedReview>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matching: Vec<AnnotatedReview> = inner
            .newest_first()
            .into_iter()
            .map(|r| inner.annotate(r))
            .filter(|a| {
                matches!(a.priority, Some(p) if p <= 2)
                    && matches!(a.sentiment, Some(Sentiment::Negative | Sentiment::Neutral))
            })
            .collect();
        // stable sort keeps newest-first within a level
        matching.sort_by_key(|a| a.priority);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn recent_reviews(&self, limit: usize) -> Result<Vec<AnnotatedReview>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .newest_first()
            .into_iter()
            .take(limit)
            .map(|r| inner.annotate(r))
            .collect())
    }

    async fn reviews_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<AnnotatedReview>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .newest_first()
            .into_iter()
            .filter(|r| r.ingested_at >= since)
            .map(|r| inner.annotate(r))
            .collect())
    }

    async fn replace_action_plans(&self, plans: &[ActionPlan]) -> Result<usize, StoreError> {
        self.check("plans")?;
        let created_at = Utc::now();
        let mut inner = self.inner.lock().unwrap();
        inner.plans = plans
            .iter()
            .map(|plan| StoredActionPlan {
                id: Uuid::new_v4(),
                plan: plan.clone(),
                created_at,
            })
            .collect();
        Ok(plans.len())
    }

    async fn action_plans(&self, limit: usize) -> Result<Vec<StoredActionPlan>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.plans.iter().take(limit).cloned().collect())
    }
}
