//! Theme + plan orchestration.
//!
//! Flow: high-priority reviews (store) → cluster (1 oracle call) →
//!       per theme: reference lookup → plan (1 oracle call each).
//!
//! `steps` is the read-mostly entry point: stored plans are served as-is,
//! generation only happens when nothing is stored or a refresh is requested.

use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::llm_client::Oracle;
use crate::store::{ReviewStore, StoreError};
use crate::themes::cluster::cluster;
use crate::themes::models::{ActionPlan, StoredActionPlan};
use crate::themes::plans::generate_plan;
use crate::themes::references::ReferenceStore;
use crate::triage::models::AnnotatedReview;

/// Reviews fed to the clustering call.
pub const HIGH_PRIORITY_LIMIT: usize = 50;
/// Stored plans served by `steps`.
pub const STORED_PLAN_LIMIT: usize = 20;
/// High-priority reviews listed when no plan could be generated.
pub const FALLBACK_REVIEW_LIMIT: usize = 5;

pub const MISSING_CREDENTIAL: &str = "OpenAI API key not configured";

/// Collaborators needed to turn stored reviews into plans.
#[derive(Clone, Copy)]
pub struct PlanSources<'a> {
    pub store: &'a dyn ReviewStore,
    pub oracle: &'a dyn Oracle,
    pub references: &'a dyn ReferenceStore,
    pub call_delay: Duration,
}

/// Clusters the current high-priority reviews and drafts one plan per theme.
/// Only a failure to read the reviews is an error; oracle failures shrink the output.
pub async fn generate_action_plans(sources: PlanSources<'_>) -> Result<Vec<ActionPlan>, StoreError> {
    let reviews = sources.store.high_priority_reviews(HIGH_PRIORITY_LIMIT).await?;
    if reviews.is_empty() {
        info!("No high-priority reviews to cluster");
        return Ok(Vec::new());
    }

    let themes = cluster(sources.oracle, &reviews).await;
    if themes.is_empty() {
        warn!("No themes identified from {} high-priority reviews", reviews.len());
        return Ok(Vec::new());
    }

    let mut plans = Vec::with_capacity(themes.len());
    for (i, theme) in themes.iter().enumerate() {
        if i > 0 && !sources.call_delay.is_zero() {
            tokio::time::sleep(sources.call_delay).await;
        }

        let reference = sources.references.lookup(&theme.title).await;
        if reference.is_some() {
            info!("Using reference workflow for theme '{}'", theme.title);
        }
        plans.push(generate_plan(sources.oracle, theme, reference.as_deref()).await);
    }

    info!("Generated {} action plans", plans.len());
    Ok(plans)
}

/// Generates plans and, when any were produced, replaces the stored set.
pub async fn regenerate_action_plans(
    sources: PlanSources<'_>,
) -> Result<Vec<ActionPlan>, StoreError> {
    let plans = generate_action_plans(sources).await?;
    if !plans.is_empty() {
        sources.store.replace_action_plans(&plans).await?;
    }
    Ok(plans)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepsSource {
    Stored,
    Generated,
    Fallback,
}

/// Result of the steps entry point. Zero plans is a valid outcome.
#[derive(Debug, Serialize)]
pub struct StepsOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<StepsSource>,
    pub action_plans: Vec<StoredActionPlan>,
    /// Populated only when no plan could be generated.
    pub high_priority_reviews: Vec<AnnotatedReview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepsOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            source: None,
            action_plans: Vec::new(),
            high_priority_reviews: Vec::new(),
            error: Some(error.into()),
        }
    }

    fn plans(source: StepsSource, action_plans: Vec<StoredActionPlan>) -> Self {
        Self {
            success: true,
            source: Some(source),
            action_plans,
            high_priority_reviews: Vec::new(),
            error: None,
        }
    }
}

/// Serves stored plans, or generates them when none exist (or `refresh` is set).
/// Without an oracle only stored plans can be served.
pub async fn steps(
    store: &dyn ReviewStore,
    oracle: Option<&dyn Oracle>,
    references: &dyn ReferenceStore,
    call_delay: Duration,
    refresh: bool,
) -> StepsOutcome {
    if !refresh {
        match store.action_plans(STORED_PLAN_LIMIT).await {
            Ok(stored) if !stored.is_empty() => {
                return StepsOutcome::plans(StepsSource::Stored, stored)
            }
            Ok(_) => {}
            Err(e) => {
                error!("Error loading stored action plans: {e}");
                return StepsOutcome::failed(e.to_string());
            }
        }
    }

    let Some(oracle) = oracle else {
        return StepsOutcome::failed(MISSING_CREDENTIAL);
    };

    let sources = PlanSources {
        store,
        oracle,
        references,
        call_delay,
    };
    let generated = match regenerate_action_plans(sources).await {
        Ok(plans) => plans,
        Err(e) => {
            error!("Error generating action plans: {e}");
            return StepsOutcome::failed(e.to_string());
        }
    };

    if !generated.is_empty() {
        return match store.action_plans(generated.len()).await {
            Ok(stored) => StepsOutcome::plans(StepsSource::Generated, stored),
            Err(e) => {
                error!("Error reading back action plans: {e}");
                StepsOutcome::failed(e.to_string())
            }
        };
    }

    match store.high_priority_reviews(FALLBACK_REVIEW_LIMIT).await {
        Ok(reviews) => StepsOutcome {
            success: true,
            source: Some(StepsSource::Fallback),
            action_plans: Vec::new(),
            high_priority_reviews: reviews,
            error: None,
        },
        Err(e) => StepsOutcome::failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::StubOracle;
    use crate::llm_client::RequestKind;
    use crate::store::memory::MemoryStore;
    use crate::themes::cluster::CLUSTER_SUBJECT;
    use crate::themes::plans::FALLBACK_STEP;
    use crate::themes::test_support::StaticReferences;
    use crate::triage::models::Sentiment;
    use crate::triage::pipeline::PriorityResult;
    use crate::triage::sentiment::SentimentResult;
    use crate::triage::test_support::new_review;

    const THEMES: &str = r#"[
        {"title": "Launch crashes", "summary": "The app crashes on start.", "review_ids": ["a", "b"]},
        {"title": "Double billing", "summary": "Users are charged twice.", "review_ids": ["c"]}
    ]"#;

    const PLAN: &str = r#"{"action_steps": ["Investigate"], "user_response": "We're on it."}"#;

    async fn triaged(store: &MemoryStore, id: &str, priority: u8, sentiment: Sentiment) {
        store
            .insert_review(&new_review(id, priority, &format!("review {id}")))
            .await
            .unwrap();
        store
            .save_sentiments(&[SentimentResult {
                review_id: id.to_string(),
                sentiment,
                confidence: 0.9,
            }])
            .await
            .unwrap();
        store
            .save_priorities(&[PriorityResult {
                review_id: id.to_string(),
                priority,
            }])
            .await
            .unwrap();
    }

    async fn populated() -> MemoryStore {
        let store = MemoryStore::new();
        triaged(&store, "a", 1, Sentiment::Negative).await;
        triaged(&store, "b", 2, Sentiment::Neutral).await;
        triaged(&store, "c", 1, Sentiment::Negative).await;
        triaged(&store, "happy", 5, Sentiment::Positive).await;
        store
    }

    fn sources<'a>(
        store: &'a MemoryStore,
        oracle: &'a StubOracle,
        references: &'a StaticReferences,
    ) -> PlanSources<'a> {
        PlanSources {
            store,
            oracle,
            references,
            call_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_one_plan_per_theme_in_theme_order() {
        let store = populated().await;
        let oracle = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default();

        let plans = generate_action_plans(sources(&store, &oracle, &references))
            .await
            .unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].title, "Launch crashes");
        assert_eq!(plans[0].review_count, 2);
        assert_eq!(plans[1].title, "Double billing");
        assert_eq!(oracle.call_count(RequestKind::ActionPlan), 2);
    }

    #[tokio::test]
    async fn test_failed_plan_keeps_other_themes() {
        let store = populated().await;
        let oracle = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .fail(RequestKind::ActionPlan, "Launch crashes")
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default();

        let plans = generate_action_plans(sources(&store, &oracle, &references))
            .await
            .unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].action_steps, vec![FALLBACK_STEP.to_string()]);
        assert_eq!(plans[1].action_steps, vec!["Investigate".to_string()]);
    }

    #[tokio::test]
    async fn test_no_high_priority_reviews_skips_oracle() {
        let store = MemoryStore::new();
        triaged(&store, "happy", 5, Sentiment::Positive).await;
        let oracle = StubOracle::new();
        let references = StaticReferences::default();

        let plans = generate_action_plans(sources(&store, &oracle, &references))
            .await
            .unwrap();

        assert!(plans.is_empty());
        assert!(oracle.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reference_document_reaches_plan_prompt() {
        let store = populated().await;
        let oracle = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default().with("Double billing", "1. Refund");

        let plans = generate_action_plans(sources(&store, &oracle, &references))
            .await
            .unwrap();

        assert_eq!(plans.len(), 2);
        let with_doc = oracle
            .prompt_for(RequestKind::ActionPlan, "Double billing")
            .unwrap();
        assert!(with_doc.contains("1. Refund"));
        let without_doc = oracle
            .prompt_for(RequestKind::ActionPlan, "Launch crashes")
            .unwrap();
        assert!(!without_doc.contains("existing workflow"));
    }

    #[tokio::test]
    async fn test_steps_serves_stored_plans_without_oracle() {
        let store = populated().await;
        let oracle = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default();
        regenerate_action_plans(sources(&store, &oracle, &references))
            .await
            .unwrap();

        let outcome = steps(&store, None, &references, Duration::ZERO, false).await;

        assert!(outcome.success);
        assert_eq!(outcome.source, Some(StepsSource::Stored));
        assert_eq!(outcome.action_plans.len(), 2);
    }

    #[tokio::test]
    async fn test_steps_generates_and_saves_when_nothing_stored() {
        let store = populated().await;
        let oracle = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default();

        let outcome = steps(&store, Some(&oracle), &references, Duration::ZERO, false).await;

        assert_eq!(outcome.source, Some(StepsSource::Generated));
        assert_eq!(outcome.action_plans.len(), 2);
        assert_eq!(store.action_plans(STORED_PLAN_LIMIT).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_steps_without_credential_and_nothing_stored_fails() {
        let store = populated().await;
        let references = StaticReferences::default();

        let outcome = steps(&store, None, &references, Duration::ZERO, false).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some(MISSING_CREDENTIAL));
    }

    #[tokio::test]
    async fn test_steps_falls_back_to_reviews_when_no_themes() {
        let store = populated().await;
        let oracle = StubOracle::new().respond(RequestKind::Themes, CLUSTER_SUBJECT, "not json");
        let references = StaticReferences::default();

        let outcome = steps(&store, Some(&oracle), &references, Duration::ZERO, true).await;

        assert!(outcome.success);
        assert_eq!(outcome.source, Some(StepsSource::Fallback));
        assert!(outcome.action_plans.is_empty());
        assert_eq!(outcome.high_priority_reviews.len(), 3);
        assert_eq!(outcome.high_priority_reviews[0].priority, Some(1));
    }

    #[tokio::test]
    async fn test_refresh_replaces_stored_plans() {
        let store = populated().await;
        let first = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default();
        steps(&store, Some(&first), &references, Duration::ZERO, false).await;

        let second = StubOracle::new()
            .respond(
                RequestKind::Themes,
                CLUSTER_SUBJECT,
                r#"[{"title": "Everything", "summary": "All of it.", "review_ids": ["a", "b", "c"]}]"#,
            )
            .default_response(RequestKind::ActionPlan, PLAN);
        let outcome = steps(&store, Some(&second), &references, Duration::ZERO, true).await;

        assert_eq!(outcome.action_plans.len(), 1);
        let stored = store.action_plans(STORED_PLAN_LIMIT).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].plan.title, "Everything");
        assert_eq!(stored[0].plan.review_count, 3);
    }

    #[tokio::test]
    async fn test_plan_write_failure_is_reported() {
        let store = populated().await;
        store.fail_writes("plans");
        let oracle = StubOracle::new()
            .respond(RequestKind::Themes, CLUSTER_SUBJECT, THEMES)
            .default_response(RequestKind::ActionPlan, PLAN);
        let references = StaticReferences::default();

        let outcome = steps(&store, Some(&oracle), &references, Duration::ZERO, false).await;

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }
}
