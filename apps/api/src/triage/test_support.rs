use chrono::{TimeZone, Utc};

use crate::triage::models::{NewReview, Review, StageStatus};

pub fn new_review(id: &str, rating: u8, text: &str) -> NewReview {
    NewReview {
        review_id: id.to_string(),
        app_id: "com.example.app".to_string(),
        author: format!("user-{id}"),
        text: text.to_string(),
        rating,
        collected_at: Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap(),
    }
}

pub fn review(id: &str, rating: u8, text: &str) -> Review {
    let new = new_review(id, rating, text);
    Review {
        review_id: new.review_id,
        app_id: new.app_id,
        author: new.author,
        text: new.text,
        rating: new.rating,
        collected_at: new.collected_at,
        ingested_at: new.collected_at,
        status: StageStatus::default(),
    }
}
