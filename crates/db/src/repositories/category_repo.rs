//! Repository for the `categories` table.

use reshub_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::category::Category;

pub struct CategoryRepo;

impl CategoryRepo {
    /// All categories with their parent's name, parents first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            "SELECT c.id, c.name, c.description, c.parent_id, p.name AS parent_name, c.created_at \
             FROM categories c \
             LEFT JOIN categories p ON c.parent_id = p.id \
             ORDER BY c.parent_id NULLS FIRST, c.name",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn exists(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }
}
