//! Ingredient handlers

use axum::{Extension, Json, extract::Query, extract::State, http::StatusCode};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{CatalogQuery, CreateIngredientRequest, IngredientResponse},
    state::AppState,
    validation::validate_name,
};

/// List the authenticated user's ingredients
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<IngredientResponse>>> {
    let ingredients = state
        .ingredient_repository
        .list(user.id, query.assigned_only())
        .await
        .map_err(|e| {
            error!("Failed to list ingredients: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(
        ingredients
            .into_iter()
            .map(IngredientResponse::from)
            .collect(),
    ))
}

/// Create an ingredient owned by the authenticated user
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateIngredientRequest>,
) -> ApiResult<(StatusCode, Json<IngredientResponse>)> {
    validate_name(&payload.name).map_err(ApiError::Validation)?;

    let ingredient = state
        .ingredient_repository
        .create(user.id, &payload.name)
        .await
        .map_err(|e| {
            error!("Failed to create ingredient: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((StatusCode::CREATED, Json(IngredientResponse::from(ingredient))))
}
