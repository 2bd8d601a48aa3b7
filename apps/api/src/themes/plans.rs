//! Action plan generation: one oracle call per theme.
//!
//! With a reference document the oracle is asked to update that plan,
//! otherwise to draft a new one. Failures still produce a well-formed plan
//! carrying the theme's title, summary and count.

use serde::Deserialize;
use tracing::error;

use crate::llm_client::prompts::{fill, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{complete_json, Oracle, OracleRequest, RequestKind};
use crate::themes::models::{ActionPlan, Theme};
use crate::themes::prompts::{
    NEW_PLAN_INSTRUCTION, PLAN_PROMPT_TEMPLATE, PLAN_SYSTEM, UPDATE_PLAN_INSTRUCTION,
};

pub const MAX_REVIEW_SAMPLES: usize = 3;
pub const FALLBACK_STEP: &str = "Error generating action steps";
pub const FALLBACK_RESPONSE: &str =
    "We're looking into this issue and will get back to you soon.";

#[derive(Debug, Deserialize)]
struct PlanDraft {
    action_steps: Vec<String>,
    user_response: String,
}

pub fn plan_request(theme: &Theme, reference: Option<&str>) -> OracleRequest {
    let instruction = match reference {
        Some(doc) => fill(UPDATE_PLAN_INSTRUCTION, &[("reference", doc.trim())]),
        None => NEW_PLAN_INSTRUCTION.to_string(),
    };

    let reviews = theme
        .reviews
        .iter()
        .map(|r| {
            format!(
                "- \"{}\" (Rating: {}, Sentiment: {})",
                r.review.text,
                r.review.rating,
                r.sentiment.map(|s| s.as_str()).unwrap_or("Unknown")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    OracleRequest {
        kind: RequestKind::ActionPlan,
        system: PLAN_SYSTEM,
        prompt: fill(
            PLAN_PROMPT_TEMPLATE,
            &[
                ("title", &theme.title),
                ("summary", &theme.summary),
                ("instruction", &instruction),
                ("json_only", JSON_ONLY_INSTRUCTION),
                ("reviews", &reviews),
            ],
        ),
        temperature: 0.2,
        max_tokens: 1000,
        subject: theme.title.clone(),
    }
}

/// Generates the plan for `theme`. Never fails.
pub async fn generate_plan(
    oracle: &dyn Oracle,
    theme: &Theme,
    reference: Option<&str>,
) -> ActionPlan {
    let request = plan_request(theme, reference);
    match complete_json::<PlanDraft>(oracle, &request).await {
        Ok(draft) => ActionPlan {
            title: theme.title.clone(),
            summary: theme.summary.clone(),
            action_steps: draft.action_steps,
            user_response: draft.user_response,
            review_count: theme.count,
            review_samples: theme
                .reviews
                .iter()
                .take(MAX_REVIEW_SAMPLES)
                .map(|r| r.review.text.clone())
                .collect(),
        },
        Err(e) => {
            error!("Error generating action plan for theme {}: {e}", theme.title);
            fallback_plan(theme)
        }
    }
}

/// Degraded plan used when the oracle call or parsing fails.
pub fn fallback_plan(theme: &Theme) -> ActionPlan {
    ActionPlan {
        title: theme.title.clone(),
        summary: theme.summary.clone(),
        action_steps: vec![FALLBACK_STEP.to_string()],
        user_response: FALLBACK_RESPONSE.to_string(),
        review_count: theme.count,
        review_samples: Vec::new(),
    }
}
