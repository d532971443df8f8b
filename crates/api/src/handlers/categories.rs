use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use reshub_db::repositories::CategoryRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/categories
pub async fn list_categories(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let categories = CategoryRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: categories }))
}
