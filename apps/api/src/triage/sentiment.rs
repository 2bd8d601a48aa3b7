//! Sentiment stage: one oracle call per review, bare-label response.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use crate::llm_client::prompts::fill;
use crate::llm_client::{Oracle, OracleRequest, RequestKind};
use crate::triage::models::{Review, Sentiment};
use crate::triage::prompts::{SENTIMENT_PROMPT_TEMPLATE, SENTIMENT_SYSTEM};

/// The oracle exposes no confidence, so every record carries this placeholder.
pub const PLACEHOLDER_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub review_id: String,
    pub sentiment: Sentiment,
    pub confidence: f64,
}

/// Maps free-text oracle output onto a label. Anything that mentions neither
/// "positive" nor "negative" is Neutral.
pub fn normalize_sentiment(raw: &str) -> Sentiment {
    let lowered = raw.to_lowercase();
    if lowered.contains("positive") {
        Sentiment::Positive
    } else if lowered.contains("negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

pub fn sentiment_request(review: &Review) -> OracleRequest {
    OracleRequest {
        kind: RequestKind::Sentiment,
        system: SENTIMENT_SYSTEM,
        prompt: fill(
            SENTIMENT_PROMPT_TEMPLATE,
            &[
                ("rating", &review.rating.to_string()),
                ("review_text", &review.text),
            ],
        ),
        temperature: 0.0,
        max_tokens: 10,
        subject: review.review_id.clone(),
    }
}

/// Labels each review in turn, pausing `delay` between calls.
/// A failed call is logged and the review is left out of the results.
pub async fn label_sentiments(
    oracle: &dyn Oracle,
    reviews: &[&Review],
    delay: Duration,
) -> Vec<SentimentResult> {
    let mut results = Vec::with_capacity(reviews.len());

    for (i, review) in reviews.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        info!("Analyzing sentiment for review {}", review.review_id);
        match oracle.complete(&sentiment_request(review)).await {
            Ok(raw) => results.push(SentimentResult {
                review_id: review.review_id.clone(),
                sentiment: normalize_sentiment(&raw),
                confidence: PLACEHOLDER_CONFIDENCE,
            }),
            Err(e) => error!(
                "Error analyzing sentiment for review {}: {e}",
                review.review_id
            ),
        }
    }

    info!("Completed sentiment analysis for {} reviews", results.len());
    results
}
