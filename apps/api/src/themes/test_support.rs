use std::collections::HashMap;

use async_trait::async_trait;

use crate::themes::models::Theme;
use crate::themes::references::ReferenceStore;
use crate::triage::models::{AnnotatedReview, Category, Sentiment, StageStatus};
use crate::triage::test_support::review;

/// A fully triaged Negative review whose rating equals its priority.
pub fn annotated(id: &str, priority: u8, text: &str, categories: &[Category]) -> AnnotatedReview {
    let mut r = review(id, priority, text);
    r.status = StageStatus {
        sentiment_done: true,
        categories_done: true,
        priority_done: true,
    };
    AnnotatedReview {
        review: r,
        sentiment: Some(Sentiment::Negative),
        priority: Some(priority),
        categories: categories.to_vec(),
    }
}

/// A theme whose members have texts `"text of <id>"`.
pub fn theme(title: &str, member_ids: &[&str]) -> Theme {
    let reviews: Vec<AnnotatedReview> = member_ids
        .iter()
        .map(|id| annotated(id, 1, &format!("text of {id}"), &[]))
        .collect();
    Theme {
        title: title.to_string(),
        summary: format!("Summary of {title}."),
        count: reviews.len(),
        reviews,
    }
}

/// Reference documents keyed by exact theme title.
#[derive(Default)]
pub struct StaticReferences {
    docs: HashMap<String, String>,
}

impl StaticReferences {
    pub fn with(mut self, title: &str, doc: &str) -> Self {
        self.docs.insert(title.to_string(), doc.to_string());
        self
    }
}

#[async_trait]
impl ReferenceStore for StaticReferences {
    async fn lookup(&self, theme_title: &str) -> Option<String> {
        self.docs.get(theme_title).cloned()
    }
}
