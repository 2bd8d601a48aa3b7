use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentiment label assigned to a review by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Exact match against the stored label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == label)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed category vocabulary. Serialized using the human-facing labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "UI/UX")]
    UiUx,
    #[serde(rename = "Performance")]
    Performance,
    #[serde(rename = "Bugs/Crashes")]
    BugsCrashes,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "Account/Login")]
    AccountLogin,
    #[serde(rename = "Pricing")]
    Pricing,
    #[serde(rename = "Customer Support")]
    CustomerSupport,
    #[serde(rename = "Notifications")]
    Notifications,
    #[serde(rename = "Privacy/Security")]
    PrivacySecurity,
    #[serde(rename = "Payments/Billing")]
    PaymentsBilling,
    #[serde(rename = "Content")]
    Content,
    #[serde(rename = "Update Issues")]
    UpdateIssues,
    #[serde(rename = "Installation Issues")]
    InstallationIssues,
    #[serde(rename = "General Feedback")]
    GeneralFeedback,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::UiUx,
        Category::Performance,
        Category::BugsCrashes,
        Category::FeatureRequest,
        Category::AccountLogin,
        Category::Pricing,
        Category::CustomerSupport,
        Category::Notifications,
        Category::PrivacySecurity,
        Category::PaymentsBilling,
        Category::Content,
        Category::UpdateIssues,
        Category::InstallationIssues,
        Category::GeneralFeedback,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::UiUx => "UI/UX",
            Category::Performance => "Performance",
            Category::BugsCrashes => "Bugs/Crashes",
            Category::FeatureRequest => "Feature Request",
            Category::AccountLogin => "Account/Login",
            Category::Pricing => "Pricing",
            Category::CustomerSupport => "Customer Support",
            Category::Notifications => "Notifications",
            Category::PrivacySecurity => "Privacy/Security",
            Category::PaymentsBilling => "Payments/Billing",
            Category::Content => "Content",
            Category::UpdateIssues => "Update Issues",
            Category::InstallationIssues => "Installation Issues",
            Category::GeneralFeedback => "General Feedback",
        }
    }

    /// Case-insensitive lookup; surrounding whitespace and quotes are ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        let needle = label.trim().trim_matches(|c| c == '"' || c == '\'' || c == '.');
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(needle))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Triage stages. Each one is tracked independently on the review row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageStage {
    Sentiment,
    Categories,
    Priority,
}

/// Per-stage completion state of a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    pub sentiment_done: bool,
    pub categories_done: bool,
    pub priority_done: bool,
}

impl StageStatus {
    pub fn is_complete(&self) -> bool {
        self.sentiment_done && self.categories_done && self.priority_done
    }

    pub fn is_done(&self, stage: TriageStage) -> bool {
        match stage {
            TriageStage::Sentiment => self.sentiment_done,
            TriageStage::Categories => self.categories_done,
            TriageStage::Priority => self.priority_done,
        }
    }

    pub fn mark(&mut self, stage: TriageStage) {
        match stage {
            TriageStage::Sentiment => self.sentiment_done = true,
            TriageStage::Categories => self.categories_done = true,
            TriageStage::Priority => self.priority_done = true,
        }
    }
}

/// A review as collected from the upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub review_id: String,
    pub app_id: String,
    pub author: String,
    pub text: String,
    pub rating: u8,
    pub collected_at: DateTime<Utc>,
}

/// A stored review with its triage status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub review_id: String,
    pub app_id: String,
    pub author: String,
    pub text: String,
    pub rating: u8,
    pub collected_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
    pub status: StageStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentRecord {
    pub sentiment: Sentiment,
    pub confidence: f64,
}

/// A review joined with everything triage has produced for it.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedReview {
    #[serde(flatten)]
    pub review: Review,
    pub sentiment: Option<Sentiment>,
    pub priority: Option<u8>,
    pub categories: Vec<Category>,
}
