use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::StoreError;
use crate::themes::models::{ActionPlan, StoredActionPlan};

#[derive(Debug, Clone, FromRow)]
pub struct ActionPlanRow {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub steps_json: Value,
    pub response_text: String,
    pub member_count: i32,
    pub review_samples: Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ActionPlanRow> for StoredActionPlan {
    type Error = StoreError;

    fn try_from(row: ActionPlanRow) -> Result<Self, Self::Error> {
        Ok(StoredActionPlan {
            id: row.id,
            created_at: row.created_at,
            plan: ActionPlan {
                title: row.title,
                summary: row.summary,
                action_steps: serde_json::from_value(row.steps_json)?,
                user_response: row.response_text,
                review_count: row.member_count.max(0) as usize,
                review_samples: serde_json::from_value(row.review_samples)?,
            },
        })
    }
}
