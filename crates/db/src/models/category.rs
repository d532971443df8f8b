//! Category models.

use reshub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `categories` table with the parent's name resolved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<DbId>,
    pub parent_name: Option<String>,
    pub created_at: Timestamp,
}
