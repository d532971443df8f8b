use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use reshub_db::repositories::CollectionRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/collections
///
/// Collections owned by the caller, the only ones a resource can be filed
/// into.
pub async fn list_own_collections(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let collections = CollectionRepo::list_for_user(&state.pool, auth.user_id).await?;
    tracing::debug!(user_id = auth.user_id, count = collections.len(), "Listed own collections");
    Ok(Json(DataResponse { data: collections }))
}
