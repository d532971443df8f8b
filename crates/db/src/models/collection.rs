//! Collection models.

use reshub_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `collections` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Collection {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

/// A collection a resource belongs to, with its owner and the membership time.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ResourceCollection {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub added_at: Timestamp,
    pub owner_id: DbId,
    pub owner_name: String,
}

/// Body of `POST /resources/{id}/collections`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCollectionRequest {
    #[serde(default)]
    pub collection_id: serde_json::Value,
}
