//! In-memory `ResourceStore` for service-level tests.
//!
//! `begin()` snapshots the committed state; statements mutate the snapshot;
//! `commit()` publishes it. Rollback or drop discards it. A fault can be
//! injected on the Nth transactional statement to exercise rollback paths.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reshub_core::types::{DbId, Timestamp};
use reshub_core::validation::{Plan, ResourceStatus};
use reshub_db::models::activity::{RecentComment, RecentDownload, RecentReview, ReportEntry};
use reshub_db::models::collection::ResourceCollection;
use reshub_db::models::resource::{
    DependentTable, NewResource, RelatedResource, ResourceDetailRow, ResourceFilter,
    ResourceListRow, ResourceOwner, ResourcePatch, ResourceStats,
};
use reshub_db::models::tag::ResourceTag;
use reshub_db::store::{ResourceStore, StoreResult, StoreTx};

pub const ADMIN_ID: DbId = 1;
pub const ALICE_ID: DbId = 10;
pub const BOB_ID: DbId = 20;

pub const CATEGORY_PROGRAMMING: DbId = 3;
pub const CATEGORY_DESIGN: DbId = 4;

pub const TAG_GO: DbId = 5;
pub const TAG_RUST: DbId = 6;
pub const TAG_SQL: DbId = 7;
pub const TAG_DESIGN: DbId = 8;

/// Owned by Alice.
pub const ALICE_COLLECTION: DbId = 2;
/// Also owned by Alice.
pub const ALICE_SECOND_COLLECTION: DbId = 3;
/// Owned by Bob.
pub const BOB_COLLECTION: DbId = 9;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MemUser {
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemCollection {
    pub name: String,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemResource {
    pub title: String,
    pub description: Option<String>,
    pub category_id: DbId,
    pub file_url: String,
    pub file_type: Option<String>,
    pub plan: String,
    pub status: String,
    pub detail: Option<String>,
    pub user_id: DbId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemActivity {
    pub id: DbId,
    pub resource_id: DbId,
    pub user_id: DbId,
    pub rating: i32,
    pub text: String,
    pub at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub users: BTreeMap<DbId, MemUser>,
    pub categories: BTreeMap<DbId, String>,
    pub tags: BTreeMap<DbId, String>,
    pub collections: BTreeMap<DbId, MemCollection>,
    pub resources: BTreeMap<DbId, MemResource>,
    /// `(resource_id, tag_id)`
    pub resource_tags: BTreeSet<(DbId, DbId)>,
    /// `(collection_id, resource_id) -> added_at`
    pub collection_resources: BTreeMap<(DbId, DbId), Timestamp>,
    pub favorites: Vec<MemActivity>,
    pub reviews: Vec<MemActivity>,
    pub downloads: Vec<MemActivity>,
    pub comments: Vec<MemActivity>,
    pub reports: Vec<MemActivity>,
    pub next_id: DbId,
}

impl MemoryState {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    pub fn tags_of(&self, resource_id: DbId) -> BTreeSet<DbId> {
        self.resource_tags
            .iter()
            .filter(|(rid, _)| *rid == resource_id)
            .map(|(_, tid)| *tid)
            .collect()
    }

    pub fn collections_of(&self, resource_id: DbId) -> BTreeSet<DbId> {
        self.collection_resources
            .keys()
            .filter(|(_, rid)| *rid == resource_id)
            .map(|(cid, _)| *cid)
            .collect()
    }

    /// Number of rows in every table that reference `resource_id`.
    pub fn references_to(&self, resource_id: DbId) -> usize {
        let activity = [
            &self.favorites,
            &self.reviews,
            &self.downloads,
            &self.comments,
            &self.reports,
        ]
        .iter()
        .map(|rows| rows.iter().filter(|a| a.resource_id == resource_id).count())
        .sum::<usize>();
        self.tags_of(resource_id).len() + self.collections_of(resource_id).len() + activity
    }

    fn dependents_mut(&mut self, table: DependentTable) -> Option<&mut Vec<MemActivity>> {
        match table {
            DependentTable::Favorites => Some(&mut self.favorites),
            DependentTable::Downloads => Some(&mut self.downloads),
            DependentTable::Reviews => Some(&mut self.reviews),
            DependentTable::Comments => Some(&mut self.comments),
            DependentTable::Reports => Some(&mut self.reports),
            DependentTable::ResourceTags | DependentTable::CollectionResources => None,
        }
    }

    fn user_name(&self, id: DbId) -> Option<String> {
        self.users.get(&id).map(|u| u.name.clone())
    }

    fn matches(&self, id: DbId, resource: &MemResource, filter: &ResourceFilter) -> bool {
        if let Some(collection_id) = filter.collection_id {
            if !self.collection_resources.contains_key(&(collection_id, id)) {
                return false;
            }
        }
        if let Some(tag_id) = filter.tag_id {
            if !self.resource_tags.contains(&(id, tag_id)) {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            let needle = search.to_lowercase();
            let owner = self.user_name(resource.user_id).unwrap_or_default();
            let hit = resource.title.to_lowercase().contains(&needle)
                || resource
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || owner.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        filter.category_id.map_or(true, |c| resource.category_id == c)
            && filter
                .file_type
                .as_deref()
                .map_or(true, |t| resource.file_type.as_deref() == Some(t))
            && filter.status.map_or(true, |s| resource.status == s.as_str())
            && filter.plan.map_or(true, |p| resource.plan == p.as_str())
    }

    fn stats(&self, id: DbId) -> ResourceStats {
        let ratings: Vec<i32> = self
            .reviews
            .iter()
            .filter(|r| r.resource_id == id)
            .map(|r| r.rating)
            .collect();
        ResourceStats {
            favorites_count: count_for(&self.favorites, id),
            reviews_count: ratings.len() as i64,
            avg_rating: average(&ratings).unwrap_or(0.0),
            download_count: count_for(&self.downloads, id),
        }
    }

    fn tag_rows(&self, id: DbId) -> Vec<ResourceTag> {
        let mut rows: Vec<ResourceTag> = self
            .tags_of(id)
            .into_iter()
            .filter_map(|tid| {
                self.tags.get(&tid).map(|name| ResourceTag {
                    id: tid,
                    name: name.clone(),
                    description: None,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    fn collection_rows(&self, id: DbId) -> Vec<ResourceCollection> {
        let mut rows: Vec<ResourceCollection> = self
            .collection_resources
            .iter()
            .filter(|((_, rid), _)| *rid == id)
            .filter_map(|((cid, _), added_at)| {
                let collection = self.collections.get(cid)?;
                Some(ResourceCollection {
                    id: *cid,
                    name: collection.name.clone(),
                    description: None,
                    created_at: collection.created_at,
                    added_at: *added_at,
                    owner_id: collection.user_id,
                    owner_name: self.user_name(collection.user_id).unwrap_or_default(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        rows
    }

    fn list_row(&self, id: DbId, r: &MemResource) -> ResourceListRow {
        let owner = self.users.get(&r.user_id);
        ResourceListRow {
            id,
            title: r.title.clone(),
            description: r.description.clone(),
            category_id: r.category_id,
            file_url: r.file_url.clone(),
            file_type: r.file_type.clone(),
            downloads: 0,
            created_at: r.created_at,
            plan: r.plan.clone(),
            status: r.status.clone(),
            detail: r.detail.clone(),
            user_id: r.user_id,
            user_name: owner.map_or("Unknown".into(), |u| u.name.clone()),
            user_username_admin: "Unknown".into(),
            user_email: "Unknown".into(),
            user_avatar: String::new(),
            user_role: owner.map_or("user".into(), |u| u.role.clone()),
            category_name: self
                .categories
                .get(&r.category_id)
                .cloned()
                .unwrap_or_else(|| "Unknown".into()),
            category_description: String::new(),
        }
    }
}

fn count_for(rows: &[MemActivity], id: DbId) -> i64 {
    rows.iter().filter(|a| a.resource_id == id).count() as i64
}

fn average(values: &[i32]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
}

/// Fixed base instant so ordering by `created_at` is deterministic.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inner {
    state: MemoryState,
    fail_at: Option<usize>,
    statements: usize,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    clock: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Users, categories, tags and collections used across the tests.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut inner = store.lock();
            let state = &mut inner.state;
            state.next_id = 100;
            for (id, name, role) in [
                (ADMIN_ID, "Admin", "admin"),
                (ALICE_ID, "Alice", "user"),
                (BOB_ID, "Bob", "user"),
            ] {
                state.users.insert(
                    id,
                    MemUser {
                        name: name.into(),
                        role: role.into(),
                    },
                );
            }
            state.categories.insert(CATEGORY_PROGRAMMING, "Programming".into());
            state.categories.insert(CATEGORY_DESIGN, "Design".into());
            for (id, name) in [
                (TAG_GO, "go"),
                (TAG_RUST, "rust"),
                (TAG_SQL, "sql"),
                (TAG_DESIGN, "design"),
            ] {
                state.tags.insert(id, name.into());
            }
            for (id, name, owner) in [
                (ALICE_COLLECTION, "Alice reading list", ALICE_ID),
                (ALICE_SECOND_COLLECTION, "Alice archive", ALICE_ID),
                (BOB_COLLECTION, "Bob picks", BOB_ID),
            ] {
                state.collections.insert(
                    id,
                    MemCollection {
                        name: name.into(),
                        user_id: owner,
                        created_at: base_time(),
                    },
                );
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Committed state.
    pub fn state(&self) -> MemoryState {
        self.lock().state.clone()
    }

    /// Fail the `n`th transactional statement (1-based, counted from now).
    pub fn fail_on_statement(&self, n: usize) {
        let mut inner = self.lock();
        inner.statements = 0;
        inner.fail_at = Some(n);
    }

    pub fn clear_fault(&self) {
        self.lock().fail_at = None;
    }

    pub fn statements(&self) -> usize {
        self.lock().statements
    }

    pub fn begins(&self) -> usize {
        self.lock().begins
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.lock().rollbacks
    }

    fn tick(inner: &mut Inner) -> Timestamp {
        inner.clock += 1;
        base_time() + Duration::seconds(inner.clock)
    }

    /// Insert a committed resource directly and return its id.
    pub fn insert_resource(&self, owner: DbId, category_id: DbId, status: ResourceStatus) -> DbId {
        let mut inner = self.lock();
        let created_at = Self::tick(&mut inner);
        let id = inner.state.allocate_id();
        inner.state.resources.insert(
            id,
            MemResource {
                title: format!("Resource {id}"),
                description: None,
                category_id,
                file_url: format!("https://files.example.com/{id}.pdf"),
                file_type: Some("pdf".into()),
                plan: Plan::Free.as_str().into(),
                status: status.as_str().into(),
                detail: None,
                user_id: owner,
                created_at,
            },
        );
        id
    }

    pub fn attach_tag(&self, resource_id: DbId, tag_id: DbId) {
        self.lock().state.resource_tags.insert((resource_id, tag_id));
    }

    pub fn add_to_collection(&self, collection_id: DbId, resource_id: DbId) {
        let mut inner = self.lock();
        let at = Self::tick(&mut inner);
        inner
            .state
            .collection_resources
            .insert((collection_id, resource_id), at);
    }

    /// Add a row to a dependent table. `rating` only matters for reviews.
    pub fn add_activity(&self, table: DependentTable, resource_id: DbId, user_id: DbId, rating: i32) {
        let mut inner = self.lock();
        let at = Self::tick(&mut inner);
        let id = inner.state.allocate_id();
        let row = MemActivity {
            id,
            resource_id,
            user_id,
            rating,
            text: format!("{} #{id}", table.table_name()),
            at,
        };
        if let Some(rows) = inner.state.dependents_mut(table) {
            rows.push(row);
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        let mut inner = self.lock();
        inner.begins += 1;
        Ok(MemoryTx {
            store: self.clone(),
            working: inner.state.clone(),
        })
    }

    async fn list_rows(
        &self,
        filter: &ResourceFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<ResourceListRow>> {
        let state = self.state();
        let mut rows: Vec<ResourceListRow> = state
            .resources
            .iter()
            .filter(|(id, r)| state.matches(**id, r, filter))
            .map(|(id, r)| state.list_row(*id, r))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &ResourceFilter) -> StoreResult<i64> {
        let state = self.state();
        Ok(state
            .resources
            .iter()
            .filter(|(id, r)| state.matches(**id, r, filter))
            .count() as i64)
    }

    async fn resource_stats(&self, id: DbId) -> StoreResult<ResourceStats> {
        Ok(self.state().stats(id))
    }

    async fn resource_tags(&self, id: DbId) -> StoreResult<Vec<ResourceTag>> {
        Ok(self.state().tag_rows(id))
    }

    async fn resource_collections(&self, id: DbId) -> StoreResult<Vec<ResourceCollection>> {
        Ok(self.state().collection_rows(id))
    }

    async fn find_detail_row(&self, id: DbId) -> StoreResult<Option<ResourceDetailRow>> {
        let state = self.state();
        let Some(r) = state.resources.get(&id) else {
            return Ok(None);
        };
        let owner = state.users.get(&r.user_id);
        let stats = state.stats(id);
        let ratings: Vec<i32> = state
            .reviews
            .iter()
            .filter(|rv| rv.resource_id == id)
            .map(|rv| rv.rating)
            .collect();
        Ok(Some(ResourceDetailRow {
            id,
            title: r.title.clone(),
            description: r.description.clone(),
            category_id: r.category_id,
            file_url: r.file_url.clone(),
            file_type: r.file_type.clone(),
            downloads: 0,
            created_at: r.created_at,
            plan: r.plan.clone(),
            status: r.status.clone(),
            detail: r.detail.clone(),
            user_id: r.user_id,
            owner_id: owner.map(|_| r.user_id),
            owner_name: owner.map(|u| u.name.clone()),
            owner_email: None,
            owner_avatar: None,
            owner_role: owner.map(|u| u.role.clone()),
            owner_status: owner.map(|_| "active".into()),
            owner_joined_at: None,
            category_name: state.categories.get(&r.category_id).cloned(),
            category_description: None,
            favorites_count: stats.favorites_count,
            reviews_count: stats.reviews_count,
            avg_rating: average(&ratings),
            actual_download_count: stats.download_count,
            reports_count: count_for(&state.reports, id),
            comments_count: count_for(&state.comments, id),
        }))
    }

    async fn recent_reviews(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentReview>> {
        let state = self.state();
        Ok(newest_first(&state.reviews, id, Some(limit))
            .map(|a| RecentReview {
                id: a.id,
                rating: a.rating,
                comment: Some(a.text.clone()),
                created_at: a.at,
                user_id: a.user_id,
                reviewer_name: state.user_name(a.user_id).unwrap_or_default(),
                reviewer_avatar: None,
            })
            .collect())
    }

    async fn recent_comments(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentComment>> {
        let state = self.state();
        Ok(newest_first(&state.comments, id, Some(limit))
            .map(|a| RecentComment {
                id: a.id,
                content: a.text.clone(),
                created_at: a.at,
                user_id: a.user_id,
                commenter_name: state.user_name(a.user_id).unwrap_or_default(),
                commenter_avatar: None,
            })
            .collect())
    }

    async fn recent_downloads(&self, id: DbId, limit: i64) -> StoreResult<Vec<RecentDownload>> {
        let state = self.state();
        Ok(newest_first(&state.downloads, id, Some(limit))
            .map(|a| RecentDownload {
                id: a.id,
                downloaded_at: a.at,
                user_id: a.user_id,
                downloader_name: state.user_name(a.user_id).unwrap_or_default(),
            })
            .collect())
    }

    async fn reports(&self, id: DbId) -> StoreResult<Vec<ReportEntry>> {
        let state = self.state();
        Ok(newest_first(&state.reports, id, None)
            .map(|a| ReportEntry {
                id: a.id,
                reason: a.text.clone(),
                status: "pending".into(),
                created_at: a.at,
                user_id: a.user_id,
                reporter_name: state.user_name(a.user_id).unwrap_or_default(),
            })
            .collect())
    }

    async fn related(
        &self,
        id: DbId,
        category_id: DbId,
        limit: i64,
    ) -> StoreResult<Vec<RelatedResource>> {
        let state = self.state();
        let own_tags = state.tags_of(id);
        let mut rows: Vec<RelatedResource> = state
            .resources
            .iter()
            .filter(|(rid, r)| {
                **rid != id
                    && r.status == ResourceStatus::Publish.as_str()
                    && (r.category_id == category_id
                        || !state.tags_of(**rid).is_disjoint(&own_tags))
            })
            .map(|(rid, r)| RelatedResource {
                id: *rid,
                title: r.title.clone(),
                file_url: r.file_url.clone(),
                file_type: r.file_type.clone(),
                downloads: 0,
                created_at: r.created_at,
                owner_name: state.user_name(r.user_id),
                favorites_count: count_for(&state.favorites, *rid),
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn distinct_file_types(&self) -> StoreResult<Vec<String>> {
        let types: BTreeSet<String> = self
            .state()
            .resources
            .values()
            .filter_map(|r| r.file_type.clone())
            .collect();
        Ok(types.into_iter().collect())
    }
}

fn newest_first(
    rows: &[MemActivity],
    id: DbId,
    limit: Option<i64>,
) -> impl Iterator<Item = &MemActivity> {
    let mut matching: Vec<&MemActivity> = rows.iter().filter(|a| a.resource_id == id).collect();
    matching.sort_by(|a, b| b.at.cmp(&a.at));
    if let Some(limit) = limit {
        matching.truncate(limit as usize);
    }
    matching.into_iter()
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

pub struct MemoryTx {
    store: MemoryStore,
    working: MemoryState,
}

impl MemoryTx {
    /// Count a statement and fail it if it is the injected fault.
    fn step(&mut self) -> StoreResult<()> {
        let mut inner = self.store.lock();
        inner.statements += 1;
        if inner.fail_at == Some(inner.statements) {
            return Err(sqlx::Error::Protocol(format!(
                "injected failure on statement {}",
                inner.statements
            )));
        }
        Ok(())
    }

    fn now(&self) -> Timestamp {
        let mut inner = self.store.lock();
        MemoryStore::tick(&mut inner)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_resource_owner(&mut self, id: DbId) -> StoreResult<Option<ResourceOwner>> {
        self.step()?;
        Ok(self.working.resources.get(&id).map(|r| ResourceOwner {
            id,
            user_id: r.user_id,
            title: r.title.clone(),
            file_url: r.file_url.clone(),
        }))
    }

    async fn find_user_role(&mut self, user_id: DbId) -> StoreResult<Option<String>> {
        self.step()?;
        Ok(self.working.users.get(&user_id).map(|u| u.role.clone()))
    }

    async fn category_exists(&mut self, id: DbId) -> StoreResult<bool> {
        self.step()?;
        Ok(self.working.categories.contains_key(&id))
    }

    async fn tag_exists(&mut self, id: DbId) -> StoreResult<bool> {
        self.step()?;
        Ok(self.working.tags.contains_key(&id))
    }

    async fn collection_owner(&mut self, collection_id: DbId) -> StoreResult<Option<DbId>> {
        self.step()?;
        Ok(self.working.collections.get(&collection_id).map(|c| c.user_id))
    }

    async fn insert_resource(&mut self, input: &NewResource) -> StoreResult<DbId> {
        self.step()?;
        let created_at = self.now();
        let id = self.working.allocate_id();
        self.working.resources.insert(
            id,
            MemResource {
                title: input.title.clone(),
                description: input.description.clone(),
                category_id: input.category_id,
                file_url: input.file_url.clone(),
                file_type: Some(input.file_type.clone()),
                plan: input.plan.as_str().into(),
                status: input.status.as_str().into(),
                detail: input.detail.clone(),
                user_id: input.user_id,
                created_at,
            },
        );
        Ok(id)
    }

    async fn update_resource_fields(
        &mut self,
        id: DbId,
        patch: &ResourcePatch,
    ) -> StoreResult<u64> {
        self.step()?;
        let Some(r) = self.working.resources.get_mut(&id) else {
            return Ok(0);
        };
        if let Some(v) = &patch.title {
            r.title = v.clone();
        }
        if let Some(v) = &patch.description {
            r.description = Some(v.clone());
        }
        if let Some(v) = &patch.file_type {
            r.file_type = Some(v.clone());
        }
        if let Some(v) = patch.category_id {
            r.category_id = v;
        }
        if let Some(v) = &patch.file_url {
            r.file_url = v.clone();
        }
        if let Some(v) = patch.plan {
            r.plan = v.as_str().into();
        }
        if let Some(v) = &patch.detail {
            r.detail = Some(v.clone());
        }
        if let Some(v) = patch.status {
            r.status = v.as_str().into();
        }
        Ok(1)
    }

    async fn update_status(&mut self, id: DbId, status: ResourceStatus) -> StoreResult<u64> {
        self.step()?;
        Ok(match self.working.resources.get_mut(&id) {
            Some(r) => {
                r.status = status.as_str().into();
                1
            }
            None => 0,
        })
    }

    async fn has_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<bool> {
        self.step()?;
        Ok(self.working.resource_tags.contains(&(resource_id, tag_id)))
    }

    async fn insert_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<u64> {
        self.step()?;
        if !self.working.resource_tags.insert((resource_id, tag_id)) {
            return Err(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint \"resource_tags_pkey\"".into(),
            ));
        }
        Ok(1)
    }

    async fn delete_resource_tag(&mut self, resource_id: DbId, tag_id: DbId) -> StoreResult<u64> {
        self.step()?;
        Ok(u64::from(self.working.resource_tags.remove(&(resource_id, tag_id))))
    }

    async fn clear_resource_tags(&mut self, resource_id: DbId) -> StoreResult<u64> {
        self.step()?;
        let before = self.working.resource_tags.len();
        self.working.resource_tags.retain(|(rid, _)| *rid != resource_id);
        Ok((before - self.working.resource_tags.len()) as u64)
    }

    async fn has_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<bool> {
        self.step()?;
        Ok(self
            .working
            .collection_resources
            .contains_key(&(collection_id, resource_id)))
    }

    async fn insert_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<u64> {
        self.step()?;
        let at = self.now();
        if self
            .working
            .collection_resources
            .insert((collection_id, resource_id), at)
            .is_some()
        {
            return Err(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint \"collection_resources_pkey\""
                    .into(),
            ));
        }
        Ok(1)
    }

    async fn delete_collection_resource(
        &mut self,
        collection_id: DbId,
        resource_id: DbId,
    ) -> StoreResult<u64> {
        self.step()?;
        Ok(u64::from(
            self.working
                .collection_resources
                .remove(&(collection_id, resource_id))
                .is_some(),
        ))
    }

    async fn clear_owned_collection_memberships(
        &mut self,
        resource_id: DbId,
        owner_id: DbId,
    ) -> StoreResult<u64> {
        self.step()?;
        let collections = &self.working.collections;
        let before = self.working.collection_resources.len();
        self.working.collection_resources.retain(|(cid, rid), _| {
            *rid != resource_id || collections.get(cid).map(|c| c.user_id) != Some(owner_id)
        });
        Ok((before - self.working.collection_resources.len()) as u64)
    }

    async fn purge_dependents(
        &mut self,
        table: DependentTable,
        resource_id: DbId,
    ) -> StoreResult<u64> {
        self.step()?;
        let removed = match table {
            DependentTable::ResourceTags => {
                let before = self.working.resource_tags.len();
                self.working.resource_tags.retain(|(rid, _)| *rid != resource_id);
                before - self.working.resource_tags.len()
            }
            DependentTable::CollectionResources => {
                let before = self.working.collection_resources.len();
                self.working
                    .collection_resources
                    .retain(|(_, rid), _| *rid != resource_id);
                before - self.working.collection_resources.len()
            }
            other => match self.working.dependents_mut(other) {
                Some(rows) => {
                    let before = rows.len();
                    rows.retain(|a| a.resource_id != resource_id);
                    before - rows.len()
                }
                None => 0,
            },
        };
        Ok(removed as u64)
    }

    async fn delete_resource_row(&mut self, id: DbId) -> StoreResult<u64> {
        self.step()?;
        if self.working.references_to(id) > 0 {
            return Err(sqlx::Error::Protocol(format!(
                "update or delete on table \"resources\" violates foreign key constraint (id {id})"
            )));
        }
        Ok(u64::from(self.working.resources.remove(&id).is_some()))
    }

    async fn commit(self) -> StoreResult<()> {
        let mut inner = self.store.lock();
        inner.state = self.working;
        inner.commits += 1;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.store.lock().rollbacks += 1;
        Ok(())
    }
}
