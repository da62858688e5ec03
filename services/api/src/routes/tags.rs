//! Tag handlers

use axum::{Extension, Json, extract::Query, extract::State, http::StatusCode};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{CatalogQuery, CreateTagRequest, TagResponse},
    state::AppState,
    validation::validate_name,
};

/// List the authenticated user's tags
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = state
        .tag_repository
        .list(user.id, query.assigned_only())
        .await
        .map_err(|e| {
            error!("Failed to list tags: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// Create a tag owned by the authenticated user
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    validate_name(&payload.name).map_err(ApiError::Validation)?;

    let tag = state
        .tag_repository
        .create(user.id, &payload.name)
        .await
        .map_err(|e| {
            error!("Failed to create tag: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}
