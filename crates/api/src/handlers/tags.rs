use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use reshub_db::repositories::TagRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tags
///
/// Every tag, ordered by name.
pub async fn list_tags(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tags = TagRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: tags }))
}
