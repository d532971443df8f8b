//! Derived resource metrics shown on the detail view.

use crate::types::Timestamp;

/// Weighted score: favorites count double, reviews one and a half, downloads once.
pub fn popularity_score(favorites: i64, reviews: i64, downloads: i64) -> f64 {
    (favorites as f64 * 2.0 + reviews as f64 * 1.5 + downloads as f64) / 10.0
}

/// Engagement count. Downloads are deliberately excluded.
pub fn total_interactions(favorites: i64, reviews: i64, comments: i64) -> i64 {
    favorites + reviews + comments
}

/// Latest comment if any, else latest review, else the creation time.
pub fn last_activity(
    latest_comment: Option<Timestamp>,
    latest_review: Option<Timestamp>,
    created_at: Timestamp,
) -> Timestamp {
    latest_comment.or(latest_review).unwrap_or(created_at)
}
