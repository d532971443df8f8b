//! Repository for the `collections` and `collection_resources` tables.

use reshub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::collection::{Collection, ResourceCollection};

/// Provides lookups for collections and collection membership statements.
pub struct CollectionRepo;

impl CollectionRepo {
    /// Collections owned by `user_id`, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Collection>, sqlx::Error> {
        sqlx::query_as::<_, Collection>(
            "SELECT id, name, description, user_id, created_at \
             FROM collections \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Collections containing a resource, most recently added first.
    pub async fn list_for_resource(
        pool: &PgPool,
        resource_id: DbId,
    ) -> Result<Vec<ResourceCollection>, sqlx::Error> {
        sqlx::query_as::<_, ResourceCollection>(
            "SELECT c.id, c.name, c.description, c.created_at, cr.added_at, \
                    c.user_id AS owner_id, u.name AS owner_name \
             FROM collection_resources cr \
             INNER JOIN collections c ON cr.collection_id = c.id \
             INNER JOIN users u ON c.user_id = u.id \
             WHERE cr.resource_id = $1 \
             ORDER BY cr.added_at DESC",
        )
        .bind(resource_id)
        .fetch_all(pool)
        .await
    }

    /// Owner of a collection, or `None` if the collection does not exist.
    pub async fn find_owner(
        conn: &mut PgConnection,
        collection_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT user_id FROM collections WHERE id = $1")
            .bind(collection_id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn is_member(
        conn: &mut PgConnection,
        collection_id: DbId,
        resource_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM collection_resources \
                           WHERE collection_id = $1 AND resource_id = $2)",
        )
        .bind(collection_id)
        .bind(resource_id)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn add_member(
        conn: &mut PgConnection,
        collection_id: DbId,
        resource_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO collection_resources (collection_id, resource_id, added_at) \
             VALUES ($1, $2, NOW())",
        )
        .bind(collection_id)
        .bind(resource_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn remove_member(
        conn: &mut PgConnection,
        collection_id: DbId,
        resource_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM collection_resources WHERE collection_id = $1 AND resource_id = $2",
        )
        .bind(collection_id)
        .bind(resource_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove a resource from every collection owned by `owner_id`.
    /// Memberships in other users' collections are left untouched.
    pub async fn remove_owned_memberships(
        conn: &mut PgConnection,
        resource_id: DbId,
        owner_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM collection_resources cr \
             USING collections c \
             WHERE cr.collection_id = c.id AND cr.resource_id = $1 AND c.user_id = $2",
        )
        .bind(resource_id)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}
