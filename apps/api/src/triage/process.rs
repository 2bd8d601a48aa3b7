//! The process entry point: fetch → triage every pending review → themes + plans.
//!
//! Configuration problems (missing credential, no app id for a configured
//! source) are reported before any work starts. Everything after that is
//! best-effort: stage failures are recorded in the outcome, never raised.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::llm_client::Oracle;
use crate::source::{fetch_reviews, FetchOutcome, ReviewSource};
use crate::store::ReviewStore;
use crate::themes::generator::{regenerate_action_plans, PlanSources, MISSING_CREDENTIAL};
use crate::themes::references::ReferenceStore;
use crate::triage::pipeline::{run_triage, TriageOptions, TriageReport};

pub const MISSING_APP_ID: &str = "No app id given and APP_ID is not configured";

/// Collaborators used by a process run.
#[derive(Clone, Copy)]
pub struct ProcessDeps<'a> {
    pub store: &'a dyn ReviewStore,
    pub oracle: Option<&'a dyn Oracle>,
    pub source: Option<&'a dyn ReviewSource>,
    pub references: &'a dyn ReferenceStore,
}

#[derive(Debug, Clone)]
pub struct ProcessSettings {
    pub app_id: Option<String>,
    pub days_to_scrape: u32,
    pub max_reviews: usize,
    pub call_delay: Duration,
}

#[derive(Debug, Default, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchOutcome>,
    pub reviews_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage: Option<TriageReport>,
    pub action_plans_generated: usize,
    pub processing_time_seconds: f64,
}

impl ProcessOutcome {
    fn rejected(error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

pub async fn process(deps: ProcessDeps<'_>, settings: &ProcessSettings) -> ProcessOutcome {
    let started = Instant::now();

    let Some(oracle) = deps.oracle else {
        return ProcessOutcome::rejected(MISSING_CREDENTIAL);
    };
    if deps.source.is_some() && settings.app_id.is_none() {
        return ProcessOutcome::rejected(MISSING_APP_ID);
    }

    let mut outcome = ProcessOutcome {
        success: true,
        ..Default::default()
    };

    if let (Some(source), Some(app_id)) = (deps.source, settings.app_id.as_deref()) {
        let since = Utc::now() - chrono::Duration::days(i64::from(settings.days_to_scrape));
        let fetched =
            fetch_reviews(source, deps.store, app_id, since, settings.max_reviews).await;
        info!("Fetched and saved {} new reviews", fetched.saved);
        outcome.fetch = Some(fetched);
    } else {
        info!("No review source configured, triaging stored reviews only");
    }

    let pending = match deps.store.pending_reviews().await {
        Ok(pending) => pending,
        Err(e) => {
            error!("Error loading pending reviews: {e}");
            outcome.success = false;
            outcome.error = Some(e.to_string());
            outcome.processing_time_seconds = started.elapsed().as_secs_f64();
            return outcome;
        }
    };

    if pending.is_empty() {
        info!("No pending reviews to triage");
    } else {
        let options = TriageOptions {
            call_delay: settings.call_delay,
        };
        let report = run_triage(deps.store, oracle, &pending, &options).await;
        outcome.reviews_processed = pending.len();
        outcome.triage = Some(report);
    }

    let sources = PlanSources {
        store: deps.store,
        oracle,
        references: deps.references,
        call_delay: settings.call_delay,
    };
    match regenerate_action_plans(sources).await {
        Ok(plans) => outcome.action_plans_generated = plans.len(),
        Err(e) => {
            warn!("Action plan generation failed: {e}");
            outcome.error = Some(e.to_string());
        }
    }

    outcome.processing_time_seconds = started.elapsed().as_secs_f64();
    info!(
        "Processing complete: {} reviews triaged, {} action plans in {:.1}s",
        outcome.reviews_processed, outcome.action_plans_generated, outcome.processing_time_seconds
    );
    outcome
}
