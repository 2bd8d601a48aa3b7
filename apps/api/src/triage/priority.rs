//! Priority scoring: pure, deterministic, no oracle call.
//!
//! Algorithm:
//! 1. base priority = star rating (1★ → 1 "critical" … 5★ → 5 "minimal")
//! 2. Negative sentiment → one step more urgent, Positive → one step less urgent
//! 3. any escalation category present → one step more urgent, applied once
//! 4. clamp to [1, 5]

use serde::Serialize;

use crate::triage::models::{Category, Sentiment};

pub const MOST_URGENT: u8 = 1;
pub const LEAST_URGENT: u8 = 5;

/// Categories that escalate a review by a single step.
pub const ESCALATION_CATEGORIES: [Category; 4] = [
    Category::BugsCrashes,
    Category::AccountLogin,
    Category::PaymentsBilling,
    Category::PrivacySecurity,
];

pub fn score(rating: u8, sentiment: Sentiment, categories: &[Category]) -> u8 {
    let mut priority = rating.clamp(MOST_URGENT, LEAST_URGENT);

    match sentiment {
        Sentiment::Negative if priority > MOST_URGENT => priority -= 1,
        Sentiment::Positive if priority < LEAST_URGENT => priority += 1,
        _ => {}
    }

    if priority > MOST_URGENT
        && categories
            .iter()
            .any(|c| ESCALATION_CATEGORIES.contains(c))
    {
        priority -= 1;
    }

    priority.clamp(MOST_URGENT, LEAST_URGENT)
}

/// Human label for a priority level.
pub fn priority_label(level: u8) -> &'static str {
    match level {
        1 => "Critical",
        2 => "High",
        3 => "Medium",
        4 => "Low",
        5 => "Minimal",
        _ => "Unknown",
    }
}

/// Count of reviews per priority level, 1 through 5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts(pub [u32; 5]);

impl PriorityCounts {
    pub fn record(&mut self, level: u8) {
        if (MOST_URGENT..=LEAST_URGENT).contains(&level) {
            self.0[(level - 1) as usize] += 1;
        }
    }

    pub fn get(&self, level: u8) -> u32 {
        if (MOST_URGENT..=LEAST_URGENT).contains(&level) {
            self.0[(level - 1) as usize]
        } else {
            0
        }
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}
