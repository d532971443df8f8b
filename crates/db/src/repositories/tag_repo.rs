//! Repository for the `tags` and `resource_tags` tables.

use reshub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::tag::{ResourceTag, Tag};

/// Provides lookups for tags and resource-tag associations.
pub struct TagRepo;

impl TagRepo {
    /// All tags, alphabetically.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Tag>, sqlx::Error> {
        sqlx::query_as::<_, Tag>("SELECT id, name, description, created_at FROM tags ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Tags attached to a resource, alphabetically.
    pub async fn list_for_resource(
        pool: &PgPool,
        resource_id: DbId,
    ) -> Result<Vec<ResourceTag>, sqlx::Error> {
        sqlx::query_as::<_, ResourceTag>(
            "SELECT t.id, t.name, t.description \
             FROM resource_tags rt \
             INNER JOIN tags t ON rt.tag_id = t.id \
             WHERE rt.resource_id = $1 \
             ORDER BY t.name",
        )
        .bind(resource_id)
        .fetch_all(pool)
        .await
    }

    pub async fn exists(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM tags WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn is_attached(
        conn: &mut PgConnection,
        resource_id: DbId,
        tag_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM resource_tags WHERE resource_id = $1 AND tag_id = $2)",
        )
        .bind(resource_id)
        .bind(tag_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn attach(
        conn: &mut PgConnection,
        resource_id: DbId,
        tag_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO resource_tags (resource_id, tag_id) VALUES ($1, $2)")
            .bind(resource_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn detach(
        conn: &mut PgConnection,
        resource_id: DbId,
        tag_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resource_tags WHERE resource_id = $1 AND tag_id = $2")
            .bind(resource_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove every tag from a resource.
    pub async fn clear(conn: &mut PgConnection, resource_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resource_tags WHERE resource_id = $1")
            .bind(resource_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
