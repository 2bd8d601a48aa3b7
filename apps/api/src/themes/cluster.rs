//! Theme clustering: one oracle call for the whole high-priority batch.
//!
//! The oracle answers with `[{title, summary, review_ids}]`. Ids are resolved
//! back to the input reviews; unknown ids are skipped. Themes keep the oracle's
//! order. Any failure degrades to "no themes".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::llm_client::prompts::{fill, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{complete_json, LlmError, Oracle, OracleRequest, RequestKind};
use crate::themes::models::Theme;
use crate::themes::prompts::{CLUSTER_PROMPT_TEMPLATE, CLUSTER_SYSTEM};
use crate::triage::models::{AnnotatedReview, Category, Sentiment};

/// Subject used for the single clustering request.
pub const CLUSTER_SUBJECT: &str = "high-priority-batch";

/// What the oracle sees for each review.
#[derive(Debug, Serialize)]
struct ClusterInput<'a> {
    id: &'a str,
    text: &'a str,
    rating: u8,
    sentiment: Option<Sentiment>,
    priority: Option<u8>,
    categories: &'a [Category],
}

#[derive(Debug, Deserialize)]
struct ThemeDraft {
    title: String,
    summary: String,
    review_ids: Vec<String>,
}

pub fn cluster_request(reviews: &[AnnotatedReview]) -> Result<OracleRequest, LlmError> {
    let inputs: Vec<ClusterInput<'_>> = reviews
        .iter()
        .map(|r| ClusterInput {
            id: &r.review.review_id,
            text: &r.review.text,
            rating: r.review.rating,
            sentiment: r.sentiment,
            priority: r.priority,
            categories: &r.categories,
        })
        .collect();
    let reviews_json = serde_json::to_string_pretty(&inputs)?;

    Ok(OracleRequest {
        kind: RequestKind::Themes,
        system: CLUSTER_SYSTEM,
        prompt: fill(
            CLUSTER_PROMPT_TEMPLATE,
            &[
                ("json_only", JSON_ONLY_INSTRUCTION),
                ("reviews_json", &reviews_json),
            ],
        ),
        temperature: 0.0,
        max_tokens: 2000,
        subject: CLUSTER_SUBJECT.to_string(),
    })
}

/// Groups `reviews` into themes. Empty input returns immediately without an oracle call.
pub async fn cluster(oracle: &dyn Oracle, reviews: &[AnnotatedReview]) -> Vec<Theme> {
    if reviews.is_empty() {
        return Vec::new();
    }

    match try_cluster(oracle, reviews).await {
        Ok(themes) => {
            info!("Clustered {} reviews into {} themes", reviews.len(), themes.len());
            themes
        }
        Err(e) => {
            error!("Error clustering reviews into themes: {e}");
            Vec::new()
        }
    }
}

async fn try_cluster(
    oracle: &dyn Oracle,
    reviews: &[AnnotatedReview],
) -> Result<Vec<Theme>, LlmError> {
    let request = cluster_request(reviews)?;
    let drafts: Vec<ThemeDraft> = complete_json(oracle, &request).await?;
    Ok(resolve_themes(drafts, reviews))
}

fn resolve_themes(drafts: Vec<ThemeDraft>, reviews: &[AnnotatedReview]) -> Vec<Theme> {
    let by_id: HashMap<&str, &AnnotatedReview> = reviews
        .iter()
        .map(|r| (r.review.review_id.as_str(), r))
        .collect();

    drafts
        .into_iter()
        .map(|draft| {
            let members: Vec<AnnotatedReview> = draft
                .review_ids
                .iter()
                .filter_map(|id| match by_id.get(id.as_str()) {
                    Some(review) => Some((*review).clone()),
                    None => {
                        warn!("Theme '{}' references unknown review {id}", draft.title);
                        None
                    }
                })
                .collect();

            Theme {
                count: members.len(),
                title: draft.title,
                summary: draft.summary,
                reviews: members,
            }
        })
        .collect()
}
