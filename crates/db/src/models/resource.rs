//! Resource models, request DTOs and service results.

use reshub_core::error::CoreError;
use reshub_core::messages;
use reshub_core::pagination::Pagination;
use reshub_core::types::{DbId, Timestamp};
use reshub_core::validation::{non_blank, normalize_optional_id, Plan, ResourceStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::activity::{RecentComment, RecentDownload, RecentReview, ReportEntry};
use crate::models::collection::ResourceCollection;
use crate::models::tag::ResourceTag;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A row of the listing query. Owner and category columns fall back to
/// placeholder values when the referenced row is missing.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ResourceListRow {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category_id: DbId,
    pub file_url: String,
    pub file_type: Option<String>,
    pub downloads: i32,
    pub created_at: Timestamp,
    pub plan: String,
    pub status: String,
    pub detail: Option<String>,
    pub user_id: DbId,
    pub user_name: String,
    pub user_username_admin: String,
    pub user_email: String,
    pub user_avatar: String,
    pub user_role: String,
    pub category_name: String,
    pub category_description: String,
}

/// Aggregates attached to every listed resource.
#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize)]
pub struct ResourceStats {
    pub favorites_count: i64,
    pub reviews_count: i64,
    /// `0` when the resource has no reviews.
    pub avg_rating: f64,
    pub download_count: i64,
}

/// The primary row of the detail view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResourceDetailRow {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub category_id: DbId,
    pub file_url: String,
    pub file_type: Option<String>,
    pub downloads: i32,
    pub created_at: Timestamp,
    pub plan: String,
    pub status: String,
    pub detail: Option<String>,
    pub user_id: DbId,
    pub owner_id: Option<DbId>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_avatar: Option<String>,
    pub owner_role: Option<String>,
    pub owner_status: Option<String>,
    pub owner_joined_at: Option<Timestamp>,
    pub category_name: Option<String>,
    pub category_description: Option<String>,
    pub favorites_count: i64,
    pub reviews_count: i64,
    pub avg_rating: Option<f64>,
    pub actual_download_count: i64,
    pub reports_count: i64,
    pub comments_count: i64,
}

/// A published resource sharing a category or a tag with another resource.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RelatedResource {
    pub id: DbId,
    pub title: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub downloads: i32,
    pub created_at: Timestamp,
    pub owner_name: Option<String>,
    pub favorites_count: i64,
}

/// Ownership and identity columns loaded before a mutation.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ResourceOwner {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub file_url: String,
}

/// Tables holding rows that reference a resource, in the order they are
/// purged when the resource is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependentTable {
    ResourceTags,
    CollectionResources,
    Favorites,
    Downloads,
    Reviews,
    Comments,
    Reports,
}

impl DependentTable {
    pub const PURGE_ORDER: [DependentTable; 7] = [
        Self::ResourceTags,
        Self::CollectionResources,
        Self::Favorites,
        Self::Downloads,
        Self::Reviews,
        Self::Comments,
        Self::Reports,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            Self::ResourceTags => "resource_tags",
            Self::CollectionResources => "collection_resources",
            Self::Favorites => "favorites",
            Self::Downloads => "downloads",
            Self::Reviews => "reviews",
            Self::Comments => "comments",
            Self::Reports => "reports",
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Query parameters for `GET /resources`. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub file_type: Option<String>,
    pub collection_id: Option<String>,
    pub tag_id: Option<String>,
    pub status: Option<String>,
    pub plan: Option<String>,
}

/// Validated listing filters. Echoed back in the listing response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceFilter {
    pub search: Option<String>,
    pub category_id: Option<DbId>,
    pub file_type: Option<String>,
    pub collection_id: Option<DbId>,
    pub tag_id: Option<DbId>,
    pub status: Option<ResourceStatus>,
    pub plan: Option<Plan>,
}

impl ResourceFilter {
    pub fn from_params(params: &ResourceListParams) -> Result<Self, CoreError> {
        let status = non_blank(params.status.as_deref())
            .map(|s| s.parse::<ResourceStatus>())
            .transpose()?;
        let plan = non_blank(params.plan.as_deref())
            .map(|p| p.parse::<Plan>())
            .transpose()?;

        Ok(Self {
            search: non_blank(params.search.as_deref()),
            category_id: normalize_optional_id(
                params.category_id.as_deref(),
                messages::INVALID_CATEGORY_ID,
            )?,
            file_type: non_blank(params.file_type.as_deref()),
            collection_id: normalize_optional_id(
                params.collection_id.as_deref(),
                messages::INVALID_COLLECTION_ID,
            )?,
            tag_id: normalize_optional_id(params.tag_id.as_deref(), messages::INVALID_TAG_ID)?,
            status,
            plan,
        })
    }
}

/// A listed resource with its aggregates and memberships.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceListItem {
    #[serde(flatten)]
    pub resource: ResourceListRow,
    #[serde(flatten)]
    pub stats: ResourceStats,
    pub tags: Vec<ResourceTag>,
    pub collections: Vec<ResourceCollection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourcePage {
    pub resources: Vec<ResourceListItem>,
    pub pagination: Pagination,
    pub filters: ResourceFilter,
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailMetadata {
    pub total_interactions: i64,
    pub popularity_score: f64,
    pub last_activity: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDetail {
    #[serde(flatten)]
    pub resource: ResourceDetailRow,
    pub tags: Vec<ResourceTag>,
    pub collections: Vec<ResourceCollection>,
    pub recent_reviews: Vec<RecentReview>,
    pub recent_comments: Vec<RecentComment>,
    pub recent_downloads: Vec<RecentDownload>,
    pub reports: Vec<ReportEntry>,
    pub related_resources: Vec<RelatedResource>,
    pub metadata: DetailMetadata,
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Raw create input as decoded by the HTTP layer. `file_url` is set from the
/// upload result, not from the client.
#[derive(Debug, Clone, Default)]
pub struct CreateResource {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_type: Option<String>,
    pub category_id: Option<String>,
    pub plan: Option<String>,
    pub detail: Option<String>,
    pub file_url: Option<String>,
    pub collection_id: Option<String>,
    pub tag_id: Option<String>,
    pub additional_tag_ids: Vec<DbId>,
}

/// A validated row ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    pub title: String,
    pub description: Option<String>,
    pub file_type: String,
    pub category_id: DbId,
    pub file_url: String,
    pub user_id: DbId,
    pub plan: Plan,
    pub status: ResourceStatus,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagsAdded {
    pub primary_tag: DbId,
    pub additional_tags: Vec<DbId>,
    pub total_tags: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedResource {
    pub id: DbId,
    pub message: String,
    pub file_url: String,
    pub file_type: String,
    pub tags_added: TagsAdded,
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Raw update input. Blank values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateResource {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_type: Option<String>,
    pub category_id: Option<String>,
    pub file_url: Option<String>,
    pub plan: Option<String>,
    pub detail: Option<String>,
    pub status: Option<String>,
}

/// The columns an update may touch. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_type: Option<String>,
    pub category_id: Option<DbId>,
    pub file_url: Option<String>,
    pub plan: Option<Plan>,
    pub detail: Option<String>,
    pub status: Option<ResourceStatus>,
}

impl ResourcePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl TryFrom<UpdateResource> for ResourcePatch {
    type Error = CoreError;

    fn try_from(input: UpdateResource) -> Result<Self, Self::Error> {
        Ok(Self {
            title: non_blank(input.title.as_deref()),
            description: non_blank(input.description.as_deref()),
            file_type: non_blank(input.file_type.as_deref()),
            category_id: normalize_optional_id(
                input.category_id.as_deref(),
                messages::INVALID_CATEGORY_ID,
            )?,
            file_url: non_blank(input.file_url.as_deref()),
            plan: non_blank(input.plan.as_deref())
                .map(|p| p.parse::<Plan>())
                .transpose()?,
            detail: non_blank(input.detail.as_deref()),
            status: non_blank(input.status.as_deref())
                .map(|s| s.parse::<ResourceStatus>())
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatedResource {
    pub message: String,
    pub resource: ResourceDetail,
}

// ---------------------------------------------------------------------------
// Other mutation results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedResource {
    pub id: DbId,
    pub title: String,
    pub file_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagsAddedResult {
    pub added_count: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusChange {
    pub id: DbId,
    pub title: String,
    pub status: ResourceStatus,
    pub message: String,
}

/// Body of `PUT /resources/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}
