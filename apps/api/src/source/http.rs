use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{ReviewPage, ReviewSource, SourceError};

const PAGE_SIZE: u32 = 100;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// JSON review feed: `GET {base}/apps/{app_id}/reviews?sort=newest&count=100[&continuation=..]`.
#[derive(Clone)]
pub struct HttpReviewSource {
    client: Client,
    base_url: Url,
}

impl HttpReviewSource {
    pub fn new(base_url: &str) -> Result<Self, SourceError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SourceError::BaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::BaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url,
        })
    }

    /// The app id is always a single percent-encoded path segment.
    pub fn page_url(&self, app_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["apps", app_id, "reviews"]);
        }
        url
    }
}

#[async_trait]
impl ReviewSource for HttpReviewSource {
    async fn fetch_page(
        &self,
        app_id: &str,
        continuation: Option<&str>,
    ) -> Result<ReviewPage, SourceError> {
        let mut query = vec![("sort", "newest".to_string()), ("count", PAGE_SIZE.to_string())];
        if let Some(token) = continuation {
            query.push(("continuation", token.to_string()));
        }

        let response = self
            .client
            .get(self.page_url(app_id))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: ReviewPage = response.json().await?;
        debug!(
            "Fetched {} reviews for {app_id} (more: {})",
            page.reviews.len(),
            page.next.is_some()
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_trims_trailing_slash() {
        let source = HttpReviewSource::new("https://feed.example.com/v1/").unwrap();
        assert_eq!(
            source.page_url("com.example.app").as_str(),
            "https://feed.example.com/v1/apps/com.example.app/reviews"
        );
    }

    #[test]
    fn test_app_id_cannot_escape_its_path_segment() {
        let source = HttpReviewSource::new("https://feed.example.com/v1").unwrap();
        let url = source.page_url("x/../../admin?steal=1#");

        assert_eq!(url.host_str(), Some("feed.example.com"));
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(&segments[..2], &["v1", "apps"]);
        assert_eq!(segments[3], "reviews");
        assert!(segments[2].starts_with("x%2F..%2F..%2Fadmin%3F"));
        assert!(segments[2].ends_with("%23"));
    }

    #[test]
    fn test_rejects_unusable_base_url() {
        assert!(matches!(
            HttpReviewSource::new("not a url"),
            Err(SourceError::BaseUrl(_))
        ));
        assert!(matches!(
            HttpReviewSource::new("mailto:feed@example.com"),
            Err(SourceError::BaseUrl(_))
        ));
    }

    #[test]
    fn test_page_decodes_feed_shape() {
        let body = r#"{
            "reviews": [
                {"id": "gp:1", "author": "Sam", "text": "Crashes", "rating": 1, "at": 1791028800}
            ],
            "continuation": "abc"
        }"#;
        let page: ReviewPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.reviews.len(), 1);
        assert_eq!(page.reviews[0].id, "gp:1");
        assert_eq!(page.reviews[0].at.timestamp(), 1791028800);
        assert_eq!(page.next.as_deref(), Some("abc"));
    }

    #[test]
    fn test_last_page_has_no_continuation() {
        let page: ReviewPage = serde_json::from_str(r#"{"reviews": [], "continuation": null}"#).unwrap();
        assert!(page.reviews.is_empty());
        assert!(page.next.is_none());
    }
}
