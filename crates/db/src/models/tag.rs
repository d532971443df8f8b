//! Tag models.

use reshub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

/// A tag attached to a resource.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ResourceTag {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
}

/// Body of `POST /resources/{id}/tags`.
///
/// `tag_ids` is parsed leniently: a single id, an array, or a JSON-encoded
/// array string are all accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct AddTagsRequest {
    #[serde(default)]
    pub tag_ids: serde_json::Value,
}
