//! Dependent records shown on the resource detail view.
//!
//! These tables are read-only from the resource service's point of view;
//! the only write it performs on them is the purge on delete.

use reshub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentReview {
    pub id: DbId,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub user_id: DbId,
    pub reviewer_name: String,
    pub reviewer_avatar: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentComment {
    pub id: DbId,
    pub content: String,
    pub created_at: Timestamp,
    pub user_id: DbId,
    pub commenter_name: String,
    pub commenter_avatar: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecentDownload {
    pub id: DbId,
    pub downloaded_at: Timestamp,
    pub user_id: DbId,
    pub downloader_name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportEntry {
    pub id: DbId,
    pub reason: String,
    pub status: String,
    pub created_at: Timestamp,
    pub user_id: DbId,
    pub reporter_name: String,
}
