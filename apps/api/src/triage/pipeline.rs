//! Triage pipeline: runs a batch stage by stage.
//!
//! Flow: sentiment (reviews missing it) → categories (reviews missing them) →
//!       priority (every review in the batch that has a stored sentiment).
//!
//! Each stage commits its results in one store transaction before the next
//! stage starts, so an interruption leaves earlier stages durable. The
//! priority stage re-reads sentiment and categories from the store rather
//! than trusting in-memory results; a review whose categorization failed is
//! scored with an empty category set.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::llm_client::Oracle;
use crate::store::ReviewStore;
use crate::triage::categorize::categorize_reviews;
use crate::triage::models::{Review, StageStatus, TriageStage};
use crate::triage::priority::{score, PriorityCounts};
use crate::triage::sentiment::label_sentiments;

#[derive(Debug, Clone, Copy)]
pub struct TriageOptions {
    /// Courtesy pause between consecutive oracle calls.
    pub call_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityResult {
    pub review_id: String,
    pub priority: u8,
}

/// Outcome of one stage: how many units produced a result and how many were persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageCounts {
    pub processed: usize,
    pub saved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TriageReport {
    pub reviews_in_batch: usize,
    pub sentiment: StageCounts,
    pub categories: StageCounts,
    pub priorities: StageCounts,
    pub priority_counts: PriorityCounts,
    /// Reviews of the batch with every stage done once this run committed.
    pub completed: usize,
}

/// Runs all three stages over `reviews`. Never fails: oracle errors drop the
/// unit, store errors zero the stage and are reported in its `error`.
pub async fn run_triage(
    store: &dyn ReviewStore,
    oracle: &dyn Oracle,
    reviews: &[Review],
    options: &TriageOptions,
) -> TriageReport {
    let mut report = TriageReport {
        reviews_in_batch: reviews.len(),
        ..Default::default()
    };

    if reviews.is_empty() {
        return report;
    }

    let mut statuses: HashMap<&str, StageStatus> = reviews
        .iter()
        .map(|r| (r.review_id.as_str(), r.status))
        .collect();

    // Stage 1: sentiment
    let needing = pending_for(reviews, TriageStage::Sentiment);
    let sentiments = label_sentiments(oracle, &needing, options.call_delay).await;
    report.sentiment.processed = sentiments.len();
    match store.save_sentiments(&sentiments).await {
        Ok(saved) => {
            report.sentiment.saved = saved;
            mark_all(
                &mut statuses,
                sentiments.iter().map(|r| r.review_id.as_str()),
                TriageStage::Sentiment,
            );
        }
        Err(e) => {
            error!("Error saving sentiment results: {e}");
            report.sentiment.error = Some(e.to_string());
        }
    }
    info!(
        "Processed sentiment for {} reviews, saved {}",
        report.sentiment.processed, report.sentiment.saved
    );

    // Stage 2: categories
    let needing = pending_for(reviews, TriageStage::Categories);
    let categories = categorize_reviews(oracle, &needing, options.call_delay).await;
    report.categories.processed = categories.len();
    match store.replace_categories(&categories).await {
        Ok(saved) => {
            report.categories.saved = saved;
            mark_all(
                &mut statuses,
                categories.iter().map(|r| r.review_id.as_str()),
                TriageStage::Categories,
            );
        }
        Err(e) => {
            error!("Error saving category results: {e}");
            report.categories.error = Some(e.to_string());
        }
    }
    info!(
        "Processed categories for {} reviews, saved {} category associations",
        report.categories.processed, report.categories.saved
    );

    // Stage 3: priority, from persisted state only
    let (priorities, counts) = score_from_store(store, reviews).await;
    report.priorities.processed = priorities.len();
    match store.save_priorities(&priorities).await {
        Ok(saved) => {
            report.priorities.saved = saved;
            report.priority_counts = counts;
            mark_all(
                &mut statuses,
                priorities.iter().map(|r| r.review_id.as_str()),
                TriageStage::Priority,
            );
        }
        Err(e) => {
            error!("Error assigning priorities: {e}");
            report.priorities.error = Some(e.to_string());
        }
    }
    info!(
        "Assigned priorities to {} reviews ({} critical, {} high)",
        report.priority_counts.total(),
        report.priority_counts.get(1),
        report.priority_counts.get(2)
    );

    report.completed = statuses.values().filter(|s| s.is_complete()).count();
    info!(
        "{} of {} reviews fully triaged",
        report.completed, report.reviews_in_batch
    );

    report
}

fn mark_all<'a>(
    statuses: &mut HashMap<&str, StageStatus>,
    ids: impl Iterator<Item = &'a str>,
    stage: TriageStage,
) {
    for id in ids {
        if let Some(status) = statuses.get_mut(id) {
            status.mark(stage);
        }
    }
}

fn pending_for(reviews: &[Review], stage: TriageStage) -> Vec<&Review> {
    reviews
        .iter()
        .filter(|r| !r.status.is_done(stage))
        .collect()
}

async fn score_from_store(
    store: &dyn ReviewStore,
    reviews: &[Review],
) -> (Vec<PriorityResult>, PriorityCounts) {
    let mut results = Vec::new();
    let mut counts = PriorityCounts::default();

    for review in reviews {
        let sentiment = match store.sentiment_for(&review.review_id).await {
            Ok(Some(record)) => record.sentiment,
            Ok(None) => {
                warn!(
                    "Review {} has no sentiment yet, skipping priority",
                    review.review_id
                );
                continue;
            }
            Err(e) => {
                error!("Error reading sentiment for review {}: {e}", review.review_id);
                continue;
            }
        };

        let categories = match store.categories_for(&review.review_id).await {
            Ok(categories) => categories,
            Err(e) => {
                error!(
                    "Error reading categories for review {}: {e}",
                    review.review_id
                );
                continue;
            }
        };

        let priority = score(review.rating, sentiment, &categories);
        counts.record(priority);
        results.push(PriorityResult {
            review_id: review.review_id.clone(),
            priority,
        });
    }

    (results, counts)
}
