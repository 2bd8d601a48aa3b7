//! Categorization stage: comma-separated labels, validated against the fixed vocabulary.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use crate::llm_client::prompts::fill;
use crate::llm_client::{strip_json_fences, LlmError, Oracle, OracleRequest, RequestKind};
use crate::triage::models::{Category, Review};
use crate::triage::prompts::{CATEGORY_PROMPT_TEMPLATE, CATEGORY_SYSTEM};

pub const MAX_CATEGORIES_PER_REVIEW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub review_id: String,
    pub categories: Vec<Category>,
}

/// Splits a comma-separated response and keeps known labels, first occurrence wins,
/// at most three.
pub fn parse_categories(raw: &str) -> Vec<Category> {
    let mut found: Vec<Category> = Vec::new();
    for part in strip_json_fences(raw).split([',', '\n']) {
        if found.len() == MAX_CATEGORIES_PER_REVIEW {
            break;
        }
        if let Some(category) = Category::from_label(part) {
            if !found.contains(&category) {
                found.push(category);
            }
        }
    }
    found
}

pub fn category_request(review: &Review) -> OracleRequest {
    let vocabulary = Category::ALL
        .iter()
        .map(Category::label)
        .collect::<Vec<_>>()
        .join(", ");

    OracleRequest {
        kind: RequestKind::Categories,
        system: CATEGORY_SYSTEM,
        prompt: fill(
            CATEGORY_PROMPT_TEMPLATE,
            &[
                ("categories", &vocabulary),
                ("rating", &review.rating.to_string()),
                ("review_text", &review.text),
            ],
        ),
        temperature: 0.0,
        max_tokens: 50,
        subject: review.review_id.clone(),
    }
}

/// Categorizes each review in turn. A successful call that yields no known
/// label still produces a (empty) result so prior rows get cleared; an empty
/// answer counts as such a call.
pub async fn categorize_reviews(
    oracle: &dyn Oracle,
    reviews: &[&Review],
    delay: Duration,
) -> Vec<CategoryResult> {
    let mut results = Vec::with_capacity(reviews.len());

    for (i, review) in reviews.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        info!("Categorizing review {}", review.review_id);
        let raw = match oracle.complete(&category_request(review)).await {
            Ok(raw) => raw,
            Err(LlmError::EmptyContent) => String::new(),
            Err(e) => {
                error!("Error categorizing review {}: {e}", review.review_id);
                continue;
            }
        };
        results.push(CategoryResult {
            review_id: review.review_id.clone(),
            categories: parse_categories(&raw),
        });
    }

    info!("Completed categorization for {} reviews", results.len());
    results
}
