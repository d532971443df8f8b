//! Handlers for resource management.
//!
//! Path ids arrive as strings and go through `normalize_id`, so malformed
//! ids produce the domain message instead of a path rejection. All
//! endpoints require authentication via [`AuthUser`].

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use reshub_core::messages;
use reshub_core::upload::FALLBACK_FILE_TYPE;
use reshub_core::validation::{non_blank, normalize_id, normalize_id_value, require_fields};
use reshub_db::models::collection::AddToCollectionRequest;
use reshub_db::models::resource::{
    CreateResource, DeletedResource, ResourceListParams, ResourcePatch, UpdateResource,
    UpdateStatusRequest,
};
use reshub_db::models::tag::AddTagsRequest;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::multipart::ResourceForm;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;
use crate::storage::{UploadOptions, UploadRequest, UploadedBlob};

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub resource: DeletedResource,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/resources
pub async fn list_resources(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ResourceListParams>,
) -> AppResult<impl IntoResponse> {
    let page = state.resources.list_resources(&params).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/resources/file-types
pub async fn list_file_types(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let file_types = state.resources.get_all_file_types().await?;
    Ok(Json(DataResponse { data: file_types }))
}

/// GET /api/v1/resources/{id}
pub async fn get_resource(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let detail = state.resources.get_resource_by_id(id).await?;
    Ok(Json(DataResponse { data: detail }))
}

// ---------------------------------------------------------------------------
// Create / update / delete
// ---------------------------------------------------------------------------

/// POST /api/v1/resources
///
/// Multipart form with a required `file`. The text fields are checked before
/// the file is uploaded; everything else is validated by the service.
pub async fn create_resource(
    auth: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = ResourceForm::parse(&mut multipart, state.config.max_upload_bytes).await?;

    require_fields(&[
        ("title", form.text("title")),
        ("category_id", form.text("category_id")),
        ("plan", form.text("plan")),
        ("collection_id", form.text("collection_id")),
        ("tag_id", form.text("tag_id")),
    ])?;
    let file = form
        .file
        .take()
        .ok_or_else(|| AppError::BadRequest(messages::MISSING_FILE.into()))?;

    let blob = upload(&state, file).await?;
    let file_type = resolve_file_type(form.text("file_type"), &blob);

    let input = CreateResource {
        title: form.string("title"),
        description: form.string("description"),
        file_type: Some(file_type),
        category_id: form.string("category_id"),
        plan: form.string("plan"),
        detail: form.string("detail"),
        file_url: Some(blob.secure_url),
        collection_id: form.string("collection_id"),
        tag_id: form.string("tag_id"),
        additional_tag_ids: form.id_list("additional_tag_ids"),
    };
    let created = state.resources.create_resource(input, &auth.actor()).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /api/v1/resources/{id}
///
/// Multipart form; every field is optional. A new `file` replaces the stored
/// URL and is uploaded only after the edit permission check. `tag_ids` and
/// `collection_ids`, when non-empty, replace the tag set and the caller's own
/// collection memberships.
pub async fn update_resource(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let mut form = ResourceForm::parse(&mut multipart, state.config.max_upload_bytes).await?;

    let mut patch = ResourcePatch::try_from(UpdateResource {
        title: form.string("title"),
        description: form.string("description"),
        file_type: form.string("file_type"),
        category_id: form.string("category_id"),
        file_url: form.string("file_url"),
        plan: form.string("plan"),
        detail: form.string("detail"),
        status: form.string("status"),
    })?;
    let tag_ids = form.has("tag_ids").then(|| form.id_list("tag_ids"));
    let collection_ids = form
        .has("collection_ids")
        .then(|| form.id_list("collection_ids"));

    if let Some(file) = form.file.take() {
        state.resources.ensure_can_update(id, auth.user_id).await?;
        let blob = upload(&state, file).await?;
        if patch.file_type.is_none() {
            patch.file_type = Some(resolve_file_type(None, &blob));
        }
        patch.file_url = Some(blob.secure_url);
    }

    let updated = state
        .resources
        .update_resource(id, patch, auth.user_id, tag_ids, collection_ids)
        .await?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/resources/{id}
///
/// The stored file is kept; its URL is echoed back.
pub async fn delete_resource(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let deleted = state.resources.delete_resource(id, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: DeletedResponse {
            message: messages::DELETED,
            resource: deleted,
        },
    }))
}

/// PUT /api/v1/resources/{id}/status
///
/// Admin only.
pub async fn update_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let change = state
        .resources
        .update_resource_status(id, input.status.as_deref().unwrap_or_default(), auth.user_id)
        .await?;

    Ok(Json(DataResponse { data: change }))
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// GET /api/v1/resources/{id}/tags
pub async fn list_resource_tags(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let tags = state.resources.get_resource_tags(id).await?;
    Ok(Json(DataResponse { data: tags }))
}

/// POST /api/v1/resources/{id}/tags
///
/// `tag_ids` may be an array, a JSON-encoded array string or a single id.
pub async fn add_resource_tags(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AddTagsRequest>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    if input.tag_ids.is_null() {
        return Err(AppError::BadRequest(messages::INVALID_TAG_LIST.into()));
    }
    let tag_ids = reshub_core::validation::parse_id_list(&input.tag_ids);

    let result = state
        .resources
        .add_tags_to_resource(id, tag_ids, auth.user_id)
        .await?;

    Ok(Json(DataResponse { data: result }))
}

/// DELETE /api/v1/resources/{id}/tags/{tag_id}
pub async fn remove_resource_tag(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let tag_id = normalize_id(&tag_id, messages::INVALID_TAG_ID)?;
    state
        .resources
        .remove_tag_from_resource(id, tag_id, auth.user_id)
        .await?;

    Ok(Json(MessageResponse::new(messages::TAG_REMOVED)))
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// GET /api/v1/resources/{id}/collections
pub async fn list_resource_collections(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let collections = state.resources.get_resource_collections(id).await?;
    Ok(Json(DataResponse { data: collections }))
}

/// POST /api/v1/resources/{id}/collections
pub async fn add_to_collection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AddToCollectionRequest>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let collection_id = normalize_id_value(&input.collection_id, messages::INVALID_COLLECTION_ID)?;
    state
        .resources
        .add_resource_to_collection(id, collection_id, auth.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(messages::ADDED_TO_COLLECTION)),
    ))
}

/// DELETE /api/v1/resources/{id}/collections/{collection_id}
pub async fn remove_from_collection(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((id, collection_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let id = normalize_id(&id, messages::INVALID_RESOURCE_ID)?;
    let collection_id = normalize_id(&collection_id, messages::INVALID_COLLECTION_ID)?;
    state
        .resources
        .remove_resource_from_collection(id, collection_id, auth.user_id)
        .await?;

    Ok(Json(MessageResponse::new(messages::REMOVED_FROM_COLLECTION)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn upload(state: &AppState, file: UploadRequest) -> AppResult<UploadedBlob> {
    let size = file.bytes.len();
    let blob = state
        .uploader
        .upload(file, &state.upload_folder, UploadOptions::default())
        .await?;
    tracing::info!(size, url = %blob.secure_url, "Resource file uploaded");
    Ok(blob)
}

/// Client value first, then the uploader's classification, then `"other"`.
fn resolve_file_type(client: Option<&str>, blob: &UploadedBlob) -> String {
    non_blank(client)
        .or_else(|| non_blank(blob.resource_type.as_deref()))
        .unwrap_or_else(|| FALLBACK_FILE_TYPE.to_string())
}
