//! [`ResourceStore`] over a PostgreSQL pool.

use async_trait::async_trait;
use reshub_core::types::DbId;
use reshub_core::validation::ResourceStatus;
use sqlx::{PgPool, Postgres, Transaction};

use super::{ResourceStore, StoreResult, StoreTx};
use crate::models::activity::{RecentComment, RecentDownload, RecentReview, ReportEntry};
use crate::models::collection::ResourceCollection;
use crate::models::resource::{
    DependentTable, NewResource, RelatedResource, ResourceDetailRow, ResourceFilter,
    ResourceListRow, ResourceOwner, ResourcePatch, ResourceStats,
};
use crate::models::tag::ResourceTag;
use crate::repositories::{
    ActivityRepo, CategoryRepo, CollectionRepo, ResourceRepo, TagRepo, UserRepo,
};

#[derive(Debug, Clone)]
pub struct PgResourceStore {
    pool: PgPool,
}

impl PgResourceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// An open PostgreSQL transaction. Rolled back on drop unless committed.
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ResourceStore for PgResourceStore {
    type Tx = PgStoreTx;

    async fn begin(&self) -> StoreResult<PgStoreTx> {
        let tx = self.pool.begin().await?;
        Ok(PgStoreTx { tx })
    }

    async fn list_rows(
        &self,
        filter: &ResourceFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<ResourceListRow>> {
        ResourceRepo::list(&self.pool, filter, limit, offset).await
    }

    async fn count(&self, filter: &ResourceFilter) -> StoreResult<i64> {
        ResourceRepo::count(&self.pool, filter).await
    }

    async fn resource_stats(&self, id: DbId) -> StoreResult<ResourceStats> {
        ResourceRepo::stats(&self.pool, id).await
    }

    async fn resource_tags(&self, id: DbId) -> StoreResult<Vec<ResourceTag>> {
        TagRepo::list_for_resource(&self.pool, id).await
    }

    async fn resource_collections(&self, id: DbId) -> StoreResult<Vec<ResourceCollection>> {
        CollectionRepo::list_for_resource(&self.pool, id).await
    }

    async fn find_detail_row(&self, id: DbId) -> StoreResult<Option<ResourceDetailRow>> {
        ResourceRepo::find_detail(&self.pool, id).await
    }

    async fn recent_reviews(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentReview>> {
        ActivityRepo::recent_reviews(&self.pool, id, limit).await
    }

    async fn recent_comments(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentComment>> {
        ActivityRepo::recent_comments(&self.pool, id, limit).await
    }

    async fn recent_downloads(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentDownload>> {
        ActivityRepo::recent_downloads(&self.pool, id, limit).await
    }

    async fn reports(&self, id: DbId) -> StoreResult<Vec<ReportEntry>> {
        ActivityRepo::reports(&self.pool, id).await
    }

    async fn related(
        &self,
        id: DbId,
        category_id: DbId,
        limit: i64,
    ) -> StoreResult<Vec<RelatedResource>> {
        ResourceRepo::related(&self.pool, id, category_id, limit).await
    }

    async fn distinct_file_types(&self) -> StoreResult<Vec<String>> {
        ResourceRepo::distinct_file_types(&self.pool).await
    }
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn find_resource_owner(&mut self, id: DbId) -> StoreResult<Option<ResourceOwner>> {
        ResourceRepo::find_owner(&mut self.tx, id).await
    }

    async fn find_user_role(&mut self, user_id: DbId) -> StoreResult<Option<String>> {
        UserRepo::find_role(&mut self.tx, user_id).await
    }

    async fn category_exists(&mut self, id: DbId) -> StoreResult<bool> {
        CategoryRepo::exists(&mut self.tx, id).await
    }

    async fn tag_exists(&mut self, id: DbId) -> StoreResult<bool> {
        TagRepo::exists(&mut self.tx, id).await
    }

    async fn collection_owner(&mut self, collection_id: DbId) -> StoreResult<Option<DbId>> {
        CollectionRepo::find_owner(&mut self.tx, collection_id).await
    }

    async fn insert_resource(&mut self, input: &NewResource) -> StoreResult<DbId> {
        ResourceRepo::insert(&mut self.tx, input).await
    }

    async fn update_resource_fields(
        &mut self,
        id: DbId,
        patch: &ResourcePatch,
    ) -> StoreResult<u64> {
        ResourceRepo::update_fields(&mut self.tx, id, patch).await
    }

    async fn update_status(&mut self, id: DbId, status: ResourceStatus) -> StoreResult<u64> {
        ResourceRepo::update_status(&mut self.tx, id, status).await
    }

    async fn has_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<bool> {
        TagRepo::is_attached(&mut self.tx, resource_id, tag_id).await
    }

    async fn insert_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<u64> {
        TagRepo::attach(&mut self.tx, resource_id, tag_id).await
    }

    async fn delete_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<u64> {
        TagRepo::detach(&mut self.tx, resource_id, tag_id).await
    }

    async fn clear_resource_tags(&mut self, resource_id: DbId) -> StoreResult<u64> {
        TagRepo::clear(&mut self.tx, resource_id).await
    }

    async fn has_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<bool> {
        CollectionRepo::is_member(&mut self.tx, collection_id, resource_id).await
    }

    async fn insert_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<u64> {
        CollectionRepo::add_member(&mut self.tx, collection_id, resource_id).await
    }

    async fn delete_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<u64> {
        CollectionRepo::remove_member(&mut self.tx, collection_id, resource_id).await
    }

    async fn clear_owned_collection_memberships(
        &mut self,
        resource_id: DbId,
        owner_id: DbId,
    ) -> StoreResult<u64> {
        CollectionRepo::remove_owned_memberships(&mut self.tx, resource_id, owner_id).await
    }

    async fn purge_dependents(
        &mut self,
        table: DependentTable,
        resource_id: DbId,
    ) -> StoreResult<u64> {
        ResourceRepo::purge_dependents(&mut self.tx, table, resource_id).await
    }

    async fn delete_resource_row(&mut self, id: DbId) -> StoreResult<u64> {
        ResourceRepo::delete(&mut self.tx, id).await
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await
    }
}
