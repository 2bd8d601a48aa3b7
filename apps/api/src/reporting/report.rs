//! Aggregate counts over a window of ingested reviews.

use std::collections::HashMap;

use serde::Serialize;

use crate::triage::models::{AnnotatedReview, Category, Sentiment};
use crate::triage::priority::{priority_label, LEAST_URGENT, MOST_URGENT};

pub const TOP_CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentBucket {
    pub sentiment: Sentiment,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityBucket {
    pub level: u8,
    pub label: &'static str,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub category: Category,
    pub count: usize,
    pub percentage: f64,
}

/// Percentages are relative to `total_reviews`. Buckets with no reviews are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub days: u32,
    pub total_reviews: usize,
    /// Highest rating first.
    pub ratings: Vec<RatingBucket>,
    pub sentiments: Vec<SentimentBucket>,
    /// Most urgent first.
    pub priorities: Vec<PriorityBucket>,
    pub top_categories: Vec<CategoryBucket>,
    /// False when no review in the window has a sentiment yet.
    pub sentiment_analyzed: bool,
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    // one decimal place
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

pub fn build_report(reviews: &[AnnotatedReview], days: u32) -> Report {
    let total = reviews.len();

    let ratings = (1u8..=5)
        .rev()
        .map(|rating| (rating, reviews.iter().filter(|r| r.review.rating == rating).count()))
        .filter(|(_, count)| *count > 0)
        .map(|(rating, count)| RatingBucket {
            rating,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    let sentiments: Vec<SentimentBucket> = Sentiment::ALL
        .into_iter()
        .map(|s| (s, reviews.iter().filter(|r| r.sentiment == Some(s)).count()))
        .filter(|(_, count)| *count > 0)
        .map(|(sentiment, count)| SentimentBucket {
            sentiment,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    let priorities = (MOST_URGENT..=LEAST_URGENT)
        .map(|level| (level, reviews.iter().filter(|r| r.priority == Some(level)).count()))
        .filter(|(_, count)| *count > 0)
        .map(|(level, count)| PriorityBucket {
            level,
            label: priority_label(level),
            count,
            percentage: percentage(count, total),
        })
        .collect();

    let mut category_counts: HashMap<Category, usize> = HashMap::new();
    for category in reviews.iter().flat_map(|r| r.categories.iter()) {
        *category_counts.entry(*category).or_default() += 1;
    }
    let mut top: Vec<(Category, usize)> = category_counts.into_iter().collect();
    top.sort_by(|(ca, a), (cb, b)| b.cmp(a).then(ca.cmp(cb)));
    let top_categories = top
        .into_iter()
        .take(TOP_CATEGORY_LIMIT)
        .map(|(category, count)| CategoryBucket {
            category,
            count,
            percentage: percentage(count, total),
        })
        .collect();

    Report {
        days,
        total_reviews: total,
        ratings,
        sentiment_analyzed: !sentiments.is_empty(),
        sentiments,
        priorities,
        top_categories,
    }
}
