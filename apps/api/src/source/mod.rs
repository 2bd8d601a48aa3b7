//! Review source: paginated newest-first feed of store reviews.
//!
//! `fetch_reviews` walks pages until it passes the cutoff, hits the cap, or the
//! feed stops yielding anything new. Upstream errors end the walk; whatever was
//! saved before the error stays saved and is reported alongside it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::store::ReviewStore;
use crate::triage::models::NewReview;

pub mod http;

pub use http::HttpReviewSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid review source base URL: {0}")]
    BaseUrl(String),

    #[error("Review source returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[cfg(test)]
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// One review as the feed reports it. `at` is seconds since the epoch.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceReview {
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    pub rating: i64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub at: DateTime<Utc>,
}

impl SourceReview {
    fn into_new_review(self, app_id: &str) -> NewReview {
        NewReview {
            review_id: self.id,
            app_id: app_id.to_string(),
            author: self.author,
            text: self.text,
            rating: self.rating.clamp(1, 5) as u8,
            collected_at: self.at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<SourceReview>,
    #[serde(rename = "continuation")]
    pub next: Option<String>,
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Fetches one page, newest first. `continuation` is `None` for the first page.
    async fn fetch_page(
        &self,
        app_id: &str,
        continuation: Option<&str>,
    ) -> Result<ReviewPage, SourceError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchOutcome {
    /// Items examined inside the window.
    pub fetched: usize,
    /// Items that were new and got stored.
    pub saved: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn fetch_reviews(
    source: &dyn ReviewSource,
    store: &dyn ReviewStore,
    app_id: &str,
    since: DateTime<Utc>,
    max_count: usize,
) -> FetchOutcome {
    info!("Fetching reviews for app {app_id} since {since} (max: {max_count})");

    let mut outcome = FetchOutcome::default();
    let mut continuation: Option<String> = None;
    let mut first_page = true;

    loop {
        let page = match source.fetch_page(app_id, continuation.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                error!("Error fetching reviews for app {app_id}: {e}");
                outcome.error = Some(e.to_string());
                break;
            }
        };

        if page.reviews.is_empty() {
            info!("No more reviews returned");
            break;
        }

        let mut saved_this_page = 0;
        let mut stop = false;
        for item in page.reviews {
            if item.at < since {
                info!("Found review older than cutoff date");
                stop = true;
                break;
            }
            if outcome.fetched >= max_count {
                info!("Reached max reviews limit: {max_count}");
                stop = true;
                break;
            }
            outcome.fetched += 1;

            match store.insert_review(&item.into_new_review(app_id)).await {
                Ok(true) => {
                    outcome.saved += 1;
                    saved_this_page += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    error!("Error saving review: {e}");
                    outcome.error = Some(e.to_string());
                    stop = true;
                    break;
                }
            }
        }

        if stop {
            break;
        }
        if !first_page && saved_this_page == 0 {
            info!("No new reviews in this batch, stopping fetch");
            break;
        }
        if outcome.fetched >= max_count {
            info!("Reached max reviews limit: {max_count}");
            break;
        }
        match page.next {
            Some(token) => continuation = Some(token),
            None => break,
        }
        first_page = false;
    }

    info!(
        "Review fetch complete: {} fetched, {} new saved",
        outcome.fetched, outcome.saved
    );
    outcome
}
