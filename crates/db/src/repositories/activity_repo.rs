//! Read queries over the records that reference a resource: reviews,
//! comments, downloads and reports.

use reshub_core::types::DbId;
use sqlx::PgPool;

use crate::models::activity::{RecentComment, RecentDownload, RecentReview, ReportEntry};

pub struct ActivityRepo;

impl ActivityRepo {
    pub async fn recent_reviews(
        pool: &PgPool,
        resource_id: DbId,
        limit: i64,
    ) -> Result<Vec<RecentReview>, sqlx::Error> {
        sqlx::query_as::<_, RecentReview>(
            "SELECT rv.id, rv.rating, rv.comment, rv.created_at, rv.user_id, \
                    u.name AS reviewer_name, u.avatar AS reviewer_avatar \
             FROM reviews rv \
             INNER JOIN users u ON rv.user_id = u.id \
             WHERE rv.resource_id = $1 \
             ORDER BY rv.created_at DESC \
             LIMIT $2",
        )
        .bind(resource_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn recent_comments(
        pool: &PgPool,
        resource_id: DbId,
        limit: i64,
    ) -> Result<Vec<RecentComment>, sqlx::Error> {
        sqlx::query_as::<_, RecentComment>(
            "SELECT cm.id, cm.content, cm.created_at, cm.user_id, \
                    u.name AS commenter_name, u.avatar AS commenter_avatar \
             FROM comments cm \
             INNER JOIN users u ON cm.user_id = u.id \
             WHERE cm.resource_id = $1 \
             ORDER BY cm.created_at DESC \
             LIMIT $2",
        )
        .bind(resource_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn recent_downloads(
        pool: &PgPool,
        resource_id: DbId,
        limit: i64,
    ) -> Result<Vec<RecentDownload>, sqlx::Error> {
        sqlx::query_as::<_, RecentDownload>(
            "SELECT d.id, d.downloaded_at, d.user_id, u.name AS downloader_name \
             FROM downloads d \
             INNER JOIN users u ON d.user_id = u.id \
             WHERE d.resource_id = $1 \
             ORDER BY d.downloaded_at DESC \
             LIMIT $2",
        )
        .bind(resource_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Every report filed against a resource, newest first.
    pub async fn reports(pool: &PgPool, resource_id: DbId) -> Result<Vec<ReportEntry>, sqlx::Error> {
        sqlx::query_as::<_, ReportEntry>(
            "SELECT rep.id, rep.reason, rep.status, rep.created_at, rep.user_id, \
                    u.name AS reporter_name \
             FROM reports rep \
             INNER JOIN users u ON rep.user_id = u.id \
             WHERE rep.resource_id = $1 \
             ORDER BY rep.created_at DESC",
        )
        .bind(resource_id)
        .fetch_all(pool)
        .await
    }
}
