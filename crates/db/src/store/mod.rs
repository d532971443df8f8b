//! Injected store abstraction used by [`ResourceService`].
//!
//! [`ResourceStore`] is held by the service for its whole lifetime and
//! serves the read queries. Every mutating operation opens a [`StoreTx`],
//! issues its statements through it and finishes with `commit` or
//! `rollback`. A transaction dropped without either is rolled back.
//!
//! [`ResourceService`]: crate::services::resource_service::ResourceService

use async_trait::async_trait;
use reshub_core::types::DbId;
use reshub_core::validation::ResourceStatus;

use crate::models::activity::{RecentComment, RecentDownload, RecentReview, ReportEntry};
use crate::models::collection::ResourceCollection;
use crate::models::resource::{
    DependentTable, NewResource, RelatedResource, ResourceDetailRow, ResourceFilter,
    ResourceListRow, ResourceOwner, ResourcePatch, ResourceStats,
};
use crate::models::tag::ResourceTag;

mod postgres;

pub use postgres::{PgResourceStore, PgStoreTx};

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    type Tx: StoreTx;

    /// Open a transaction for one mutating operation.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    async fn list_rows(
        &self,
        filter: &ResourceFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<ResourceListRow>>;

    async fn count(&self, filter: &ResourceFilter) -> StoreResult<i64>;

    async fn resource_stats(&self, id: DbId) -> StoreResult<ResourceStats>;

    async fn resource_tags(&self, id: DbId) -> StoreResult<Vec<ResourceTag>>;

    async fn resource_collections(&self, id: DbId) -> StoreResult<Vec<ResourceCollection>>;

    async fn find_detail_row(&self, id: DbId) -> StoreResult<Option<ResourceDetailRow>>;

    async fn recent_reviews(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentReview>>;

    async fn recent_comments(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentComment>>;

    async fn recent_downloads(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentDownload>>;

    async fn reports(&self, id: DbId) -> StoreResult<Vec<ReportEntry>>;

    async fn related(
        &self,
        id: DbId,
        category_id: DbId,
        limit: i64,
    ) -> StoreResult<Vec<RelatedResource>>;

    async fn distinct_file_types(&self) -> StoreResult<Vec<String>>;
}

/// The statements a mutating operation may issue inside its transaction.
///
/// Mutating statements return the number of rows affected.
#[async_trait]
pub trait StoreTx: Send {
    async fn find_resource_owner(&mut self, id: DbId) -> StoreResult<Option<ResourceOwner>>;

    async fn find_user_role(&mut self, user_id: DbId) -> StoreResult<Option<String>>;

    async fn category_exists(&mut self, id: DbId) -> StoreResult<bool>;

    async fn tag_exists(&mut self, id: DbId) -> StoreResult<bool>;

    /// Owner of a collection, `None` if it does not exist.
    async fn collection_owner(&mut self, collection_id: DbId) -> StoreResult<Option<DbId>>;

    async fn insert_resource(&mut self, input: &NewResource) -> StoreResult<DbId>;

    async fn update_resource_fields(&mut self, id: DbId, patch: &ResourcePatch)
        -> StoreResult<u64>;

    async fn update_status(&mut self, id: DbId, status: ResourceStatus) -> StoreResult<u64>;

    async fn has_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<bool>;

    async fn insert_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<u64>;

    async fn delete_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<u64>;

    async fn clear_resource_tags(&mut self, resource_id: DbId) -> StoreResult<u64>;

    async fn has_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<bool>;

    async fn insert_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<u64>;

    async fn delete_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<u64>;

    /// Remove the resource from every collection owned by `owner_id`.
    async fn clear_owned_collection_memberships(
        &mut self,
        resource_id: DbId,
        owner_id: DbId,
    ) -> StoreResult<u64>;

    async fn purge_dependents(&mut self, table: DependentTable, resource_id: DbId)
        -> StoreResult<u64>;

    async fn delete_resource_row(&mut self, id: DbId) -> StoreResult<u64>;

    async fn commit(self) -> StoreResult<()>;

    async fn rollback(self) -> StoreResult<()>;
}
