//! Repository for the `resources` table.
//!
//! Reads take `&PgPool`. Statements that belong to a mutating operation take
//! `&mut PgConnection` so the caller can run them inside its transaction.

use reshub_core::types::DbId;
use reshub_core::validation::ResourceStatus;
use sqlx::{PgConnection, PgPool};

use crate::models::resource::{
    DependentTable, NewResource, RelatedResource, ResourceDetailRow, ResourceFilter,
    ResourceListRow, ResourceOwner, ResourcePatch, ResourceStats,
};

/// Column list for the listing query. Tolerates missing owner/category rows.
const LIST_COLUMNS: &str = "\
    r.id, r.title, r.description, r.category_id, r.file_url, r.file_type, \
    r.downloads, r.created_at, r.plan, r.status, r.detail, r.user_id, \
    COALESCE(u.name, 'Unknown') AS user_name, \
    COALESCE(u.username_admin, 'Unknown') AS user_username_admin, \
    COALESCE(u.email, 'Unknown') AS user_email, \
    COALESCE(u.avatar, '') AS user_avatar, \
    COALESCE(u.role, 'user') AS user_role, \
    COALESCE(c.name, 'Unknown') AS category_name, \
    COALESCE(c.description, '') AS category_description";

const LIST_FROM: &str = "\
    FROM resources r \
    LEFT JOIN users u ON r.user_id = u.id \
    LEFT JOIN categories c ON r.category_id = c.id";

const DETAIL_QUERY: &str = "\
    SELECT r.id, r.title, r.description, r.category_id, r.file_url, r.file_type, \
           r.downloads, r.created_at, r.plan, r.status, r.detail, r.user_id, \
           u.id AS owner_id, u.name AS owner_name, u.email AS owner_email, \
           u.avatar AS owner_avatar, u.role AS owner_role, u.status AS owner_status, \
           u.created_at AS owner_joined_at, \
           c.name AS category_name, c.description AS category_description, \
           (SELECT COUNT(*) FROM favorites f WHERE f.resource_id = r.id) AS favorites_count, \
           (SELECT COUNT(*) FROM reviews rv WHERE rv.resource_id = r.id) AS reviews_count, \
           (SELECT AVG(rv2.rating)::float8 FROM reviews rv2 WHERE rv2.resource_id = r.id) AS avg_rating, \
           (SELECT COUNT(*) FROM downloads d WHERE d.resource_id = r.id) AS actual_download_count, \
           (SELECT COUNT(*) FROM reports rep WHERE rep.resource_id = r.id) AS reports_count, \
           (SELECT COUNT(*) FROM comments cm WHERE cm.resource_id = r.id) AS comments_count \
    FROM resources r \
    LEFT JOIN users u ON r.user_id = u.id \
    LEFT JOIN categories c ON r.category_id = c.id \
    WHERE r.id = $1";

/// A bind value for the dynamic listing predicates.
enum FilterBind<'a> {
    Text(&'a str),
    Owned(String),
    Id(DbId),
}

/// Joins, predicates and binds shared by the page query and the count query.
#[derive(Default)]
struct ListClauses<'a> {
    joins: Vec<&'static str>,
    conditions: Vec<String>,
    binds: Vec<FilterBind<'a>>,
}

impl<'a> ListClauses<'a> {
    fn from_filter(filter: &'a ResourceFilter) -> Self {
        let mut clauses = Self::default();

        if let Some(collection_id) = filter.collection_id {
            clauses
                .joins
                .push("INNER JOIN collection_resources cr ON r.id = cr.resource_id");
            clauses.push(|n| format!("cr.collection_id = ${n}"), FilterBind::Id(collection_id));
        }
        if let Some(tag_id) = filter.tag_id {
            clauses
                .joins
                .push("INNER JOIN resource_tags rt ON r.id = rt.resource_id");
            clauses.push(|n| format!("rt.tag_id = ${n}"), FilterBind::Id(tag_id));
        }
        if let Some(search) = &filter.search {
            clauses.push(
                |n| format!("(r.title ILIKE ${n} OR r.description ILIKE ${n} OR u.name ILIKE ${n})"),
                FilterBind::Owned(format!("%{search}%")),
            );
        }
        if let Some(category_id) = filter.category_id {
            clauses.push(|n| format!("r.category_id = ${n}"), FilterBind::Id(category_id));
        }
        if let Some(file_type) = &filter.file_type {
            clauses.push(|n| format!("r.file_type = ${n}"), FilterBind::Text(file_type));
        }
        if let Some(status) = filter.status {
            clauses.push(|n| format!("r.status = ${n}"), FilterBind::Text(status.as_str()));
        }
        if let Some(plan) = filter.plan {
            clauses.push(|n| format!("r.plan = ${n}"), FilterBind::Text(plan.as_str()));
        }

        clauses
    }

    fn push(&mut self, condition: impl FnOnce(usize) -> String, bind: FilterBind<'a>) {
        let placeholder = self.binds.len() + 1;
        self.conditions.push(condition(placeholder));
        self.binds.push(bind);
    }

    /// Everything after the base `FROM`: joins plus the `WHERE` conjunction.
    fn tail(&self) -> String {
        let mut sql = String::new();
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        sql
    }
}

/// Provides queries and statements for resources.
pub struct ResourceRepo;

impl ResourceRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// One page of resources matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ResourceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ResourceListRow>, sqlx::Error> {
        let clauses = ListClauses::from_filter(filter);
        let next = clauses.binds.len() + 1;
        let sql = format!(
            "SELECT DISTINCT {LIST_COLUMNS} {LIST_FROM}{} \
             ORDER BY r.created_at DESC, r.id DESC \
             LIMIT ${} OFFSET ${}",
            clauses.tail(),
            next,
            next + 1,
        );

        let mut query = sqlx::query_as::<_, ResourceListRow>(&sql);
        for bind in &clauses.binds {
            query = match bind {
                FilterBind::Text(value) => query.bind(*value),
                FilterBind::Owned(value) => query.bind(value.as_str()),
                FilterBind::Id(value) => query.bind(*value),
            };
        }
        query.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Number of distinct resources matching `filter`.
    pub async fn count(pool: &PgPool, filter: &ResourceFilter) -> Result<i64, sqlx::Error> {
        let clauses = ListClauses::from_filter(filter);
        let sql = format!("SELECT COUNT(DISTINCT r.id) {LIST_FROM}{}", clauses.tail());

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for bind in &clauses.binds {
            query = match bind {
                FilterBind::Text(value) => query.bind(*value),
                FilterBind::Owned(value) => query.bind(value.as_str()),
                FilterBind::Id(value) => query.bind(*value),
            };
        }
        query.fetch_one(pool).await
    }

    pub async fn stats(pool: &PgPool, id: DbId) -> Result<ResourceStats, sqlx::Error> {
        sqlx::query_as::<_, ResourceStats>(
            "SELECT \
                 (SELECT COUNT(*) FROM favorites f WHERE f.resource_id = $1) AS favorites_count, \
                 (SELECT COUNT(*) FROM reviews rv WHERE rv.resource_id = $1) AS reviews_count, \
                 (SELECT COALESCE(AVG(rv2.rating)::float8, 0) FROM reviews rv2 \
                  WHERE rv2.resource_id = $1) AS avg_rating, \
                 (SELECT COUNT(*) FROM downloads d WHERE d.resource_id = $1) AS download_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    /// The detail row with owner, category and six aggregates.
    pub async fn find_detail(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ResourceDetailRow>, sqlx::Error> {
        sqlx::query_as::<_, ResourceDetailRow>(DETAIL_QUERY)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Published resources sharing the category or any tag, excluding `id`.
    pub async fn related(
        pool: &PgPool,
        id: DbId,
        category_id: DbId,
        limit: i64,
    ) -> Result<Vec<RelatedResource>, sqlx::Error> {
        sqlx::query_as::<_, RelatedResource>(
            "SELECT DISTINCT r2.id, r2.title, r2.file_url, r2.file_type, r2.downloads, \
                    r2.created_at, u2.name AS owner_name, \
                    (SELECT COUNT(*) FROM favorites f2 WHERE f2.resource_id = r2.id) AS favorites_count \
             FROM resources r2 \
             LEFT JOIN users u2 ON r2.user_id = u2.id \
             LEFT JOIN resource_tags rt2 ON r2.id = rt2.resource_id \
             WHERE r2.id <> $1 \
               AND r2.status = 'publish' \
               AND (r2.category_id = $2 \
                    OR rt2.tag_id IN (SELECT rt.tag_id FROM resource_tags rt WHERE rt.resource_id = $1)) \
             ORDER BY r2.created_at DESC, r2.id DESC \
             LIMIT $3",
        )
        .bind(id)
        .bind(category_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Distinct non-null `file_type` values, sorted.
    pub async fn distinct_file_types(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT file_type FROM resources \
             WHERE file_type IS NOT NULL \
             ORDER BY file_type",
        )
        .fetch_all(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Transactional statements
    // -----------------------------------------------------------------------

    pub async fn find_owner(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ResourceOwner>, sqlx::Error> {
        sqlx::query_as::<_, ResourceOwner>(
            "SELECT id, user_id, title, file_url FROM resources WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Insert a resource and return its generated id.
    pub async fn insert(conn: &mut PgConnection, input: &NewResource) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO resources \
                (title, description, file_type, category_id, file_url, user_id, plan, status, detail) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(&input.title)
        .bind(input.description.as_deref())
        .bind(&input.file_type)
        .bind(input.category_id)
        .bind(&input.file_url)
        .bind(input.user_id)
        .bind(input.plan.as_str())
        .bind(input.status.as_str())
        .bind(input.detail.as_deref())
        .fetch_one(&mut *conn)
        .await
    }

    /// Apply the set fields of `patch`. Returns rows affected.
    pub async fn update_fields(
        conn: &mut PgConnection,
        id: DbId,
        patch: &ResourcePatch,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE resources SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 file_type = COALESCE($4, file_type), \
                 category_id = COALESCE($5, category_id), \
                 file_url = COALESCE($6, file_url), \
                 plan = COALESCE($7, plan), \
                 detail = COALESCE($8, detail), \
                 status = COALESCE($9, status) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.file_type.as_deref())
        .bind(patch.category_id)
        .bind(patch.file_url.as_deref())
        .bind(patch.plan.map(|p| p.as_str()))
        .bind(patch.detail.as_deref())
        .bind(patch.status.map(|s| s.as_str()))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_status(
        conn: &mut PgConnection,
        id: DbId,
        status: ResourceStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE resources SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every row of `table` referencing the resource.
    pub async fn purge_dependents(
        conn: &mut PgConnection,
        table: DependentTable,
        resource_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let sql = format!("DELETE FROM {} WHERE resource_id = $1", table.table_name());
        let result = sqlx::query(&sql)
            .bind(resource_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete the resource row itself. Dependents must already be gone.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
