//! Resource management: the transactional mutation engine and the read
//! composer behind the resource endpoints.
//!
//! Every mutating operation validates its input first, then runs all of its
//! statements inside one [`StoreTx`]. The transaction is committed only when
//! every step succeeds; any error rolls it back before propagating.

use reshub_core::authorization::{ensure_admin, ensure_can_mutate, Actor};
use reshub_core::error::CoreError;
use reshub_core::messages;
use reshub_core::metrics::{last_activity, popularity_score, total_interactions};
use reshub_core::pagination::{PageRequest, Pagination};
use reshub_core::types::DbId;
use reshub_core::validation::{
    ensure_positive_id, non_blank, normalize_id, require_fields, Plan, ResourceStatus,
};
use tracing::{debug, error, info, warn};

use crate::models::collection::ResourceCollection;
use crate::models::resource::{
    CreateResource, CreatedResource, DeletedResource, DependentTable, DetailMetadata,
    NewResource, ResourceDetail, ResourceFilter, ResourceListItem, ResourceListParams,
    ResourceOwner, ResourcePage, ResourcePatch, StatusChange, TagsAdded, TagsAddedResult,
    UpdatedResource,
};
use crate::models::tag::ResourceTag;
use crate::services::{ServiceError, ServiceResult};
use crate::store::{ResourceStore, StoreTx};

const RECENT_REVIEWS_LIMIT: i64 = 5;
const RECENT_COMMENTS_LIMIT: i64 = 5;
const RECENT_DOWNLOADS_LIMIT: i64 = 10;
const RELATED_LIMIT: i64 = 8;

/// How a mutation reacts to a missing resource, a missing actor and a
/// refused ownership check.
#[derive(Clone, Copy)]
struct MutationPolicy {
    resource_missing: &'static str,
    /// `true`: an unknown actor is `NotFound`. `false`: it is `Forbidden`.
    unknown_actor_not_found: bool,
    denied: &'static str,
}

const EDIT_POLICY: MutationPolicy = MutationPolicy {
    resource_missing: messages::RESOURCE_NOT_FOUND,
    unknown_actor_not_found: true,
    denied: messages::EDIT_DENIED,
};

const DELETE_POLICY: MutationPolicy = MutationPolicy {
    resource_missing: messages::RESOURCE_NOT_FOUND,
    unknown_actor_not_found: true,
    denied: messages::DELETE_DENIED,
};

const TAG_POLICY: MutationPolicy = MutationPolicy {
    resource_missing: messages::RESOURCE_MISSING,
    unknown_actor_not_found: false,
    denied: messages::EDIT_DENIED,
};

/// Resource operations over an injected store.
pub struct ResourceService<S> {
    store: S,
}

impl<S: ResourceStore> ResourceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// One filtered page of resources, each enriched with its aggregates,
    /// tags and collections.
    pub async fn list_resources(&self, params: &ResourceListParams) -> ServiceResult<ResourcePage> {
        let page = PageRequest::new(
            parse_number(params.page.as_deref()),
            parse_number(params.limit.as_deref()),
        );
        let filter = ResourceFilter::from_params(params)?;
        debug!(page = page.page, limit = page.limit, ?filter, "Listing resources");

        let rows = self.store.list_rows(&filter, page.limit, page.offset()).await?;
        let total = self.store.count(&filter).await?;

        let mut resources = Vec::with_capacity(rows.len());
        for row in rows {
            let stats = self.store.resource_stats(row.id).await?;
            let tags = self.store.resource_tags(row.id).await?;
            let collections = self.store.resource_collections(row.id).await?;
            resources.push(ResourceListItem {
                resource: row,
                stats,
                tags,
                collections,
            });
        }

        Ok(ResourcePage {
            resources,
            pagination: Pagination::compute(page, total),
            filters: filter,
        })
    }

    /// Full detail view of one resource.
    ///
    /// Store failures are reported as a curated `Internal` error; the driver
    /// message is only logged.
    pub async fn get_resource_by_id(&self, id: DbId) -> ServiceResult<ResourceDetail> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        match self.load_detail(id).await {
            Err(ServiceError::Store(err)) => {
                error!(resource_id = id, error = %err, "Failed to load resource detail");
                Err(CoreError::Internal(messages::DETAIL_LOAD_FAILED.to_string()).into())
            }
            other => other,
        }
    }

    async fn load_detail(&self, id: DbId) -> ServiceResult<ResourceDetail> {
        let resource = self
            .store
            .find_detail_row(id)
            .await?
            .ok_or_else(|| CoreError::not_found("resource", messages::RESOURCE_NOT_FOUND))?;

        let tags = self.store.resource_tags(id).await?;
        let collections = self.store.resource_collections(id).await?;
        let recent_reviews = self.store.recent_reviews(id, RECENT_REVIEWS_LIMIT).await?;
        let recent_comments = self.store.recent_comments(id, RECENT_COMMENTS_LIMIT).await?;
        let recent_downloads = self
            .store
            .recent_downloads(id, RECENT_DOWNLOADS_LIMIT)
            .await?;
        let reports = self.store.reports(id).await?;
        let related_resources = self
            .store
            .related(id, resource.category_id, RELATED_LIMIT)
            .await?;

        let metadata = DetailMetadata {
            total_interactions: total_interactions(
                resource.favorites_count,
                resource.reviews_count,
                resource.comments_count,
            ),
            popularity_score: popularity_score(
                resource.favorites_count,
                resource.reviews_count,
                resource.actual_download_count,
            ),
            last_activity: last_activity(
                recent_comments.first().map(|c| c.created_at),
                recent_reviews.first().map(|r| r.created_at),
                resource.created_at,
            ),
        };

        Ok(ResourceDetail {
            resource,
            tags,
            collections,
            recent_reviews,
            recent_comments,
            recent_downloads,
            reports,
            related_resources,
            metadata,
        })
    }

    pub async fn get_resource_tags(&self, id: DbId) -> ServiceResult<Vec<ResourceTag>> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        Ok(self.store.resource_tags(id).await?)
    }

    pub async fn get_resource_collections(
        &self,
        id: DbId,
    ) -> ServiceResult<Vec<ResourceCollection>> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        Ok(self.store.resource_collections(id).await?)
    }

    pub async fn get_all_file_types(&self) -> ServiceResult<Vec<String>> {
        Ok(self.store.distinct_file_types().await?)
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a resource with its primary tag, any valid additional tags and
    /// its initial collection membership.
    ///
    /// Additional tags that are non-positive, equal to the primary tag or do
    /// not exist are dropped silently.
    pub async fn create_resource(
        &self,
        input: CreateResource,
        actor: &Actor,
    ) -> ServiceResult<CreatedResource> {
        require_fields(&[
            ("title", input.title.as_deref()),
            ("file_type", input.file_type.as_deref()),
            ("category_id", input.category_id.as_deref()),
            ("plan", input.plan.as_deref()),
            ("file_url", input.file_url.as_deref()),
            ("collection_id", input.collection_id.as_deref()),
            ("tag_id", input.tag_id.as_deref()),
        ])?;

        let collection_id = normalize_id(
            input.collection_id.as_deref().unwrap_or_default(),
            messages::INVALID_COLLECTION_ID,
        )?;
        let primary_tag = normalize_id(
            input.tag_id.as_deref().unwrap_or_default(),
            messages::INVALID_PRIMARY_TAG_ID,
        )?;
        let category_id = normalize_id(
            input.category_id.as_deref().unwrap_or_default(),
            messages::INVALID_CATEGORY_ID,
        )?;
        let plan: Plan = input.plan.as_deref().unwrap_or_default().parse()?;

        let candidates = dedup_ids(
            input
                .additional_tag_ids
                .iter()
                .copied()
                .filter(|&id| id > 0 && id != primary_tag),
        );

        let new = NewResource {
            title: input.title.unwrap_or_default(),
            description: non_blank(input.description.as_deref()),
            file_type: input.file_type.unwrap_or_default(),
            category_id,
            file_url: input.file_url.unwrap_or_default(),
            user_id: actor.id,
            plan,
            status: ResourceStatus::initial_for(actor.is_admin()),
            detail: non_blank(input.detail.as_deref()),
        };

        let mut tx = self.store.begin().await?;
        let result = create_in_tx(&mut tx, new, collection_id, primary_tag, candidates).await;
        let created = finish(tx, result).await?;

        info!(
            resource_id = created.id,
            user_id = actor.id,
            collection_id,
            total_tags = created.tags_added.total_tags,
            "Resource created"
        );
        Ok(created)
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Apply `patch` and optionally replace the tag set and the actor's
    /// collection memberships, then return the fresh detail view.
    ///
    /// An empty (or absent) `tag_ids` / `collection_ids` leaves the
    /// corresponding set untouched.
    pub async fn update_resource(
        &self,
        id: DbId,
        patch: ResourcePatch,
        actor_id: DbId,
        tag_ids: Option<Vec<DbId>>,
        collection_ids: Option<Vec<DbId>>,
    ) -> ServiceResult<UpdatedResource> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        let tag_ids = tag_ids.map(positive_unique).filter(|ids| !ids.is_empty());
        let collection_ids = collection_ids
            .map(positive_unique)
            .filter(|ids| !ids.is_empty());

        let mut tx = self.store.begin().await?;
        let result = update_in_tx(
            &mut tx,
            id,
            &patch,
            actor_id,
            tag_ids.as_deref(),
            collection_ids.as_deref(),
        )
        .await;
        finish(tx, result).await?;

        info!(
            resource_id = id,
            user_id = actor_id,
            fields_changed = !patch.is_empty(),
            tags_replaced = tag_ids.is_some(),
            collections_replaced = collection_ids.is_some(),
            "Resource updated"
        );

        let resource = self.get_resource_by_id(id).await?;
        Ok(UpdatedResource {
            message: messages::UPDATED.to_string(),
            resource,
        })
    }

    /// Check that `actor_id` may update `id` without writing anything.
    ///
    /// Lets callers reject the request before an upload. `update_resource`
    /// repeats the check inside its own transaction.
    pub async fn ensure_can_update(&self, id: DbId, actor_id: DbId) -> ServiceResult<()> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;

        let mut tx = self.store.begin().await?;
        let result = authorize(&mut tx, id, actor_id, EDIT_POLICY).await.map(|_| ());
        if let Err(rollback_err) = tx.rollback().await {
            warn!(error = %rollback_err, "Transaction rollback failed");
        }
        result
    }

    /// Admin-only status transition.
    pub async fn update_resource_status(
        &self,
        id: DbId,
        status: &str,
        actor_id: DbId,
    ) -> ServiceResult<StatusChange> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        if status.trim().is_empty() {
            return Err(CoreError::MissingRequiredField {
                field: "status",
                message: messages::EMPTY_STATUS.to_string(),
            }
            .into());
        }
        let status: ResourceStatus = status.parse()?;

        let mut tx = self.store.begin().await?;
        let result = status_in_tx(&mut tx, id, status, actor_id).await;
        let change = finish(tx, result).await?;

        info!(resource_id = id, user_id = actor_id, status = %status, "Resource status updated");
        Ok(change)
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Delete a resource and every row referencing it.
    ///
    /// The stored file is not removed; the returned `file_url` identifies it.
    pub async fn delete_resource(&self, id: DbId, actor_id: DbId) -> ServiceResult<DeletedResource> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;

        let mut tx = self.store.begin().await?;
        let result = delete_in_tx(&mut tx, id, actor_id).await;
        let deleted = finish(tx, result).await?;

        info!(
            resource_id = id,
            user_id = actor_id,
            file_url = %deleted.file_url,
            "Resource deleted; stored file retained"
        );
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    /// Attach tags to a resource. Invalid, unknown and already-attached tags
    /// are skipped, so repeating a call is a no-op.
    pub async fn add_tags_to_resource(
        &self,
        id: DbId,
        tag_ids: Vec<DbId>,
        actor_id: DbId,
    ) -> ServiceResult<TagsAddedResult> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        let candidates = positive_unique(tag_ids);

        let mut tx = self.store.begin().await?;
        let result = add_tags_in_tx(&mut tx, id, &candidates, actor_id).await;
        let added_count = finish(tx, result).await?;

        info!(resource_id = id, user_id = actor_id, added_count, "Tags added to resource");
        Ok(TagsAddedResult {
            added_count,
            message: messages::tags_added(added_count),
        })
    }

    pub async fn remove_tag_from_resource(
        &self,
        id: DbId,
        tag_id: DbId,
        actor_id: DbId,
    ) -> ServiceResult<()> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        ensure_positive_id(tag_id, messages::INVALID_TAG_ID)?;

        let mut tx = self.store.begin().await?;
        let result = remove_tag_in_tx(&mut tx, id, tag_id, actor_id).await;
        finish(tx, result).await?;

        info!(resource_id = id, tag_id, user_id = actor_id, "Tag removed from resource");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Collections
    // -----------------------------------------------------------------------

    /// Add a resource to a collection owned by the actor.
    pub async fn add_resource_to_collection(
        &self,
        id: DbId,
        collection_id: DbId,
        actor_id: DbId,
    ) -> ServiceResult<()> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        ensure_positive_id(collection_id, messages::INVALID_COLLECTION_ID)?;

        let mut tx = self.store.begin().await?;
        let result = add_membership_in_tx(&mut tx, id, collection_id, actor_id).await;
        finish(tx, result).await?;

        info!(resource_id = id, collection_id, user_id = actor_id, "Resource added to collection");
        Ok(())
    }

    /// Remove a resource from a collection owned by the actor.
    pub async fn remove_resource_from_collection(
        &self,
        id: DbId,
        collection_id: DbId,
        actor_id: DbId,
    ) -> ServiceResult<()> {
        ensure_positive_id(id, messages::INVALID_RESOURCE_ID)?;
        ensure_positive_id(collection_id, messages::INVALID_COLLECTION_ID)?;

        let mut tx = self.store.begin().await?;
        let result = remove_membership_in_tx(&mut tx, id, collection_id, actor_id).await;
        finish(tx, result).await?;

        info!(
            resource_id = id,
            collection_id,
            user_id = actor_id,
            "Resource removed from collection"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transaction bodies
// ---------------------------------------------------------------------------

/// Commit on success, roll back on failure. A failed rollback is logged and
/// the operation's own error is returned.
async fn finish<T, Tx: StoreTx>(tx: Tx, result: ServiceResult<T>) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(err)
        }
    }
}

/// Load the resource and check that the actor may mutate it.
async fn authorize<Tx: StoreTx>(
    tx: &mut Tx,
    resource_id: DbId,
    actor_id: DbId,
    policy: MutationPolicy,
) -> ServiceResult<ResourceOwner> {
    let resource = tx
        .find_resource_owner(resource_id)
        .await?
        .ok_or_else(|| CoreError::not_found("resource", policy.resource_missing))?;

    let role = tx.find_user_role(actor_id).await?;
    if role.is_none() && policy.unknown_actor_not_found {
        return Err(CoreError::not_found("user", messages::USER_MISSING).into());
    }
    ensure_can_mutate(role.as_deref(), actor_id, resource.user_id, policy.denied)?;
    Ok(resource)
}

/// Check that the collection exists and belongs to the actor.
async fn authorize_collection<Tx: StoreTx>(
    tx: &mut Tx,
    collection_id: DbId,
    actor_id: DbId,
) -> ServiceResult<()> {
    match tx.collection_owner(collection_id).await? {
        None => Err(CoreError::not_found("collection", messages::COLLECTION_MISSING).into()),
        Some(owner) if owner != actor_id => {
            Err(CoreError::forbidden(messages::COLLECTION_DENIED).into())
        }
        Some(_) => Ok(()),
    }
}

async fn create_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    new: NewResource,
    collection_id: DbId,
    primary_tag: DbId,
    candidates: Vec<DbId>,
) -> ServiceResult<CreatedResource> {
    if !tx.category_exists(new.category_id).await? {
        return Err(CoreError::not_found("category", messages::CATEGORY_MISSING).into());
    }
    if tx.collection_owner(collection_id).await? != Some(new.user_id) {
        return Err(
            CoreError::not_found("collection", messages::COLLECTION_MISSING_OR_DENIED).into(),
        );
    }
    if !tx.tag_exists(primary_tag).await? {
        return Err(CoreError::not_found("tag", messages::TAG_MISSING).into());
    }

    let mut additional_tags = Vec::with_capacity(candidates.len());
    for tag_id in candidates {
        if tx.tag_exists(tag_id).await? {
            additional_tags.push(tag_id);
        }
    }

    let id = tx.insert_resource(&new).await?;
    tx.insert_resource_tag(id, primary_tag).await?;
    for &tag_id in &additional_tags {
        tx.insert_resource_tag(id, tag_id).await?;
    }
    tx.insert_collection_resource(collection_id, id).await?;

    let total_tags = 1 + additional_tags.len();
    Ok(CreatedResource {
        id,
        message: messages::created(total_tags),
        file_url: new.file_url,
        file_type: new.file_type,
        tags_added: TagsAdded {
            primary_tag,
            additional_tags,
            total_tags,
        },
    })
}

async fn update_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    patch: &ResourcePatch,
    actor_id: DbId,
    tag_ids: Option<&[DbId]>,
    collection_ids: Option<&[DbId]>,
) -> ServiceResult<()> {
    authorize(tx, id, actor_id, EDIT_POLICY).await?;

    if !patch.is_empty() {
        if let Some(category_id) = patch.category_id {
            if !tx.category_exists(category_id).await? {
                return Err(CoreError::not_found("category", messages::CATEGORY_MISSING).into());
            }
        }
        tx.update_resource_fields(id, patch).await?;
    }

    if let Some(tag_ids) = tag_ids {
        tx.clear_resource_tags(id).await?;
        for &tag_id in tag_ids {
            if tx.tag_exists(tag_id).await? {
                tx.insert_resource_tag(id, tag_id).await?;
            }
        }
    }

    if let Some(collection_ids) = collection_ids {
        tx.clear_owned_collection_memberships(id, actor_id).await?;
        for &collection_id in collection_ids {
            let owned = tx.collection_owner(collection_id).await? == Some(actor_id);
            if owned && !tx.has_collection_resource(collection_id, id).await? {
                tx.insert_collection_resource(collection_id, id).await?;
            }
        }
    }

    Ok(())
}

async fn status_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    status: ResourceStatus,
    actor_id: DbId,
) -> ServiceResult<StatusChange> {
    let role = tx.find_user_role(actor_id).await?;
    ensure_admin(role.as_deref(), messages::OPERATION_DENIED)?;

    let resource = tx
        .find_resource_owner(id)
        .await?
        .ok_or_else(|| CoreError::not_found("resource", messages::RESOURCE_NOT_FOUND))?;

    if tx.update_status(id, status).await? == 0 {
        return Err(CoreError::Internal(messages::STATUS_UPDATE_FAILED.to_string()).into());
    }

    Ok(StatusChange {
        id,
        title: resource.title,
        status,
        message: messages::status_updated(status.as_str()),
    })
}

async fn delete_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    actor_id: DbId,
) -> ServiceResult<DeletedResource> {
    let resource = authorize(tx, id, actor_id, DELETE_POLICY).await?;

    for table in DependentTable::PURGE_ORDER {
        let purged = tx.purge_dependents(table, id).await?;
        debug!(resource_id = id, table = table.table_name(), purged, "Purged dependents");
    }
    if tx.delete_resource_row(id).await? == 0 {
        return Err(CoreError::Internal(messages::DELETE_FAILED.to_string()).into());
    }

    Ok(DeletedResource {
        id,
        title: resource.title,
        file_url: resource.file_url,
    })
}

async fn add_tags_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    candidates: &[DbId],
    actor_id: DbId,
) -> ServiceResult<u64> {
    authorize(tx, id, actor_id, TAG_POLICY).await?;

    let mut added = 0;
    for &tag_id in candidates {
        if !tx.tag_exists(tag_id).await? || tx.has_resource_tag(id, tag_id).await? {
            continue;
        }
        added += tx.insert_resource_tag(id, tag_id).await?;
    }
    Ok(added)
}

async fn remove_tag_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    tag_id: DbId,
    actor_id: DbId,
) -> ServiceResult<()> {
    authorize(tx, id, actor_id, TAG_POLICY).await?;

    if tx.delete_resource_tag(id, tag_id).await? == 0 {
        return Err(CoreError::not_found("resource_tag", messages::TAG_NOT_ON_RESOURCE).into());
    }
    Ok(())
}

async fn add_membership_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    collection_id: DbId,
    actor_id: DbId,
) -> ServiceResult<()> {
    authorize_collection(tx, collection_id, actor_id).await?;

    if tx.find_resource_owner(id).await?.is_none() {
        return Err(CoreError::not_found("resource", messages::RESOURCE_MISSING).into());
    }
    if tx.has_collection_resource(collection_id, id).await? {
        return Err(CoreError::Conflict(messages::ALREADY_IN_COLLECTION.to_string()).into());
    }
    tx.insert_collection_resource(collection_id, id).await?;
    Ok(())
}

async fn remove_membership_in_tx<Tx: StoreTx>(
    tx: &mut Tx,
    id: DbId,
    collection_id: DbId,
    actor_id: DbId,
) -> ServiceResult<()> {
    authorize_collection(tx, collection_id, actor_id).await?;

    if tx.delete_collection_resource(collection_id, id).await? == 0 {
        return Err(CoreError::not_found(
            "collection_resource",
            messages::RESOURCE_NOT_IN_COLLECTION,
        )
        .into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lenient integer parse for `page` / `limit`; garbage falls back to defaults.
fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
}

/// Drop duplicates, keeping first occurrences in order.
fn dedup_ids(ids: impl IntoIterator<Item = DbId>) -> Vec<DbId> {
    let mut unique = Vec::new();
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

fn positive_unique(ids: Vec<DbId>) -> Vec<DbId> {
    dedup_ids(ids.into_iter().filter(|&id| id > 0))
}
