use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::triage::models::AnnotatedReview;

/// A cluster of related high-priority reviews. Not persisted on its own.
#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub title: String,
    pub summary: String,
    /// Members in the order the oracle listed them.
    pub reviews: Vec<AnnotatedReview>,
    pub count: usize,
}

/// Remediation plan for one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub title: String,
    pub summary: String,
    pub action_steps: Vec<String>,
    pub user_response: String,
    pub review_count: usize,
    pub review_samples: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredActionPlan {
    pub id: Uuid,
    #[serde(flatten)]
    pub plan: ActionPlan,
    pub created_at: DateTime<Utc>,
}
