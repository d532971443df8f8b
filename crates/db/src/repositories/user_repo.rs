//! Repository for the `users` table.

use reshub_core::types::DbId;
use sqlx::PgConnection;

pub struct UserRepo;

impl UserRepo {
    /// Role of a user, or `None` if the user does not exist.
    pub async fn find_role(conn: &mut PgConnection, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }
}
