pub mod categories;
pub mod collections;
pub mod health;
pub mod resources;
pub mod tags;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /resources                                       list, create (multipart)
/// /resources/file-types                            distinct file types
/// /resources/{id}                                  get, update (multipart), delete
/// /resources/{id}/status                           update status (admin only)
/// /resources/{id}/tags                             list, add
/// /resources/{id}/tags/{tag_id}                    remove
/// /resources/{id}/collections                      list, add
/// /resources/{id}/collections/{collection_id}      remove
///
/// /tags                                            all tags
/// /categories                                      all categories
/// /collections                                     the caller's collections
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Resource management.
        .nest("/resources", resources::router())
        // Lookup lists for the admin forms.
        .nest("/tags", tags::router())
        .nest("/categories", categories::router())
        .nest("/collections", collections::router())
}
