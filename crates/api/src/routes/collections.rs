use axum::routing::get;
use axum::Router;

use crate::handlers::collections;
use crate::state::AppState;

/// Collection routes mounted at `/collections`.
///
/// ```text
/// GET    /                  -> list_own_collections
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(collections::list_own_collections))
}
