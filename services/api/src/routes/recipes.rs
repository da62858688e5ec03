//! Recipe handlers

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult, is_foreign_key_violation},
    middleware::CurrentUser,
    models::{
        CreateRecipeRequest, Recipe, RecipeDetail, RecipeListQuery, RecipeSummary,
        UpdateRecipeRequest,
    },
    state::AppState,
    storage::is_known_image,
    validation::validate_name,
};

/// Parse a comma-separated list of UUIDs from a query parameter
fn parse_id_list(raw: Option<&str>) -> ApiResult<Vec<Uuid>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part)
                .map_err(|_| ApiError::Validation(format!("Invalid id in filter: {part}")))
        })
        .collect()
}

fn relation_error(e: anyhow::Error) -> ApiError {
    if is_foreign_key_violation(&e) {
        ApiError::Validation("Unknown tag or ingredient id".to_string())
    } else {
        error!("Failed to write recipe: {}", e);
        ApiError::InternalServerError
    }
}

fn validate_recipe_fields(title: &str, duration_minutes: i32, price: Decimal) -> ApiResult<()> {
    validate_name(title).map_err(ApiError::Validation)?;

    if duration_minutes < 0 {
        return Err(ApiError::Validation(
            "Duration must not be negative".to_string(),
        ));
    }

    if price.is_sign_negative() {
        return Err(ApiError::Validation("Price must not be negative".to_string()));
    }

    Ok(())
}

async fn detail(state: &AppState, recipe: Recipe) -> ApiResult<RecipeDetail> {
    let tags = state.recipe_repository.tags_for(recipe.id).await;
    let ingredients = state.recipe_repository.ingredients_for(recipe.id).await;

    match (tags, ingredients) {
        (Ok(tags), Ok(ingredients)) => Ok(RecipeDetail::new(recipe, tags, ingredients)),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to load recipe relations: {}", e);
            Err(ApiError::InternalServerError)
        }
    }
}

/// List the authenticated user's recipes, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RecipeListQuery>,
) -> ApiResult<Json<Vec<RecipeSummary>>> {
    let tag_ids = parse_id_list(query.tags.as_deref())?;
    let ingredient_ids = parse_id_list(query.ingredients.as_deref())?;

    let recipes = state
        .recipe_repository
        .list(user.id, &tag_ids, &ingredient_ids)
        .await
        .map_err(|e| {
            error!("Failed to list recipes: {}", e);
            ApiError::InternalServerError
        })?;

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let load_relations = async {
        let tags = state.recipe_repository.tag_ids_for(&recipe_ids).await?;
        let ingredients = state
            .recipe_repository
            .ingredient_ids_for(&recipe_ids)
            .await?;
        anyhow::Ok((tags, ingredients))
    };
    let (mut tag_map, mut ingredient_map) = load_relations.await.map_err(|e| {
        error!("Failed to load recipe relations: {}", e);
        ApiError::InternalServerError
    })?;

    let summaries = recipes
        .into_iter()
        .map(|recipe| {
            let tags = tag_map.remove(&recipe.id).unwrap_or_default();
            let ingredients = ingredient_map.remove(&recipe.id).unwrap_or_default();
            RecipeSummary::new(recipe, tags, ingredients)
        })
        .collect();

    Ok(Json(summaries))
}

/// Create a recipe owned by the authenticated user
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreateRecipeRequest>,
) -> ApiResult<(StatusCode, Json<RecipeDetail>)> {
    validate_recipe_fields(&payload.title, payload.duration_minutes, payload.price)?;

    let recipe = state
        .recipe_repository
        .create(user.id, &payload)
        .await
        .map_err(relation_error)?;

    let detail = detail(&state, recipe).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Retrieve one of the authenticated user's recipes
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe = state
        .recipe_repository
        .find_for_user(id, user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch recipe: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(detail(&state, recipe).await?))
}

/// Fully replace a recipe; omitted relation arrays clear the existing sets
pub async fn replace(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateRecipeRequest>,
) -> ApiResult<Json<RecipeDetail>> {
    validate_recipe_fields(&payload.title, payload.duration_minutes, payload.price)?;

    let recipe = state
        .recipe_repository
        .replace(id, user.id, &payload)
        .await
        .map_err(relation_error)?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(detail(&state, recipe).await?))
}

/// Partially update a recipe; absent fields and arrays are left untouched
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRecipeRequest>,
) -> ApiResult<Json<RecipeDetail>> {
    if let Some(title) = &payload.title {
        validate_name(title).map_err(ApiError::Validation)?;
    }
    if payload.duration_minutes.is_some_and(|d| d < 0) {
        return Err(ApiError::Validation(
            "Duration must not be negative".to_string(),
        ));
    }
    if payload.price.is_some_and(|p| p.is_sign_negative()) {
        return Err(ApiError::Validation("Price must not be negative".to_string()));
    }

    let recipe = state
        .recipe_repository
        .update(id, user.id, &payload)
        .await
        .map_err(relation_error)?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(detail(&state, recipe).await?))
}

/// Accept a multipart image upload for a recipe
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<RecipeDetail>> {
    let recipe = state
        .recipe_repository
        .find_for_user(id, user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch recipe: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::Validation("An image file is required".to_string()))?;

    if !is_known_image(&bytes) {
        return Err(ApiError::Validation(
            "Uploaded file is not a valid image".to_string(),
        ));
    }

    let path = state
        .image_store
        .save(&file_name, &bytes)
        .await
        .map_err(|e| {
            error!("Failed to store image: {}", e);
            ApiError::InternalServerError
        })?;

    state
        .recipe_repository
        .set_image(recipe.id, &path)
        .await
        .map_err(|e| {
            error!("Failed to record image path: {}", e);
            ApiError::InternalServerError
        })?;

    let recipe = state
        .recipe_repository
        .find_for_user(id, user.id)
        .await
        .map_err(|e| {
            error!("Failed to fetch recipe: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or_else(|| ApiError::NotFound("Recipe not found".to_string()))?;

    Ok(Json(detail(&state, recipe).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_id_lists() {
        assert!(parse_id_list(None).unwrap().is_empty());
        assert!(parse_id_list(Some("")).unwrap().is_empty());

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let parsed = parse_id_list(Some(&format!("{a},{b}"))).unwrap();
        assert_eq!(parsed, vec![a, b]);

        assert!(parse_id_list(Some("not-a-uuid")).is_err());
        assert!(parse_id_list(Some(&format!("{a},oops"))).is_err());
    }

    #[test]
    fn rejects_negative_recipe_fields() {
        let price: Decimal = "7.50".parse().unwrap();
        assert!(validate_recipe_fields("Stew", 30, price).is_ok());
        assert!(validate_recipe_fields("", 30, price).is_err());
        assert!(validate_recipe_fields("Stew", -1, price).is_err());

        let negative: Decimal = "-1.00".parse().unwrap();
        assert!(validate_recipe_fields("Stew", 30, negative).is_err());
    }
}
