//! Route definitions for resources and their tag/collection associations.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::resources;
use crate::state::AppState;

/// Resource routes mounted at `/resources`.
///
/// ```text
/// GET    /                                   -> list_resources
/// POST   /                                   -> create_resource
/// GET    /file-types                         -> list_file_types
/// GET    /{id}                               -> get_resource
/// PUT    /{id}                               -> update_resource
/// DELETE /{id}                               -> delete_resource
/// PUT    /{id}/status                        -> update_status
/// GET    /{id}/tags                          -> list_resource_tags
/// POST   /{id}/tags                          -> add_resource_tags
/// DELETE /{id}/tags/{tag_id}                 -> remove_resource_tag
/// GET    /{id}/collections                   -> list_resource_collections
/// POST   /{id}/collections                   -> add_to_collection
/// DELETE /{id}/collections/{collection_id}   -> remove_from_collection
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route("/file-types", get(resources::list_file_types))
        .route(
            "/{id}",
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .route("/{id}/status", put(resources::update_status))
        .route(
            "/{id}/tags",
            get(resources::list_resource_tags).post(resources::add_resource_tags),
        )
        .route(
            "/{id}/tags/{tag_id}",
            delete(resources::remove_resource_tag),
        )
        .route(
            "/{id}/collections",
            get(resources::list_resource_collections).post(resources::add_to_collection),
        )
        .route(
            "/{id}/collections/{collection_id}",
            delete(resources::remove_from_collection),
        )
}
