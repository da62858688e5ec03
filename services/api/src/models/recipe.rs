//! Recipe model and related payloads

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Ingredient, IngredientResponse, Tag, TagResponse};

/// Recipe entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for recipe creation and full (PUT) replacement
///
/// Omitted `tags`/`ingredients` arrays default to empty, so a full update
/// clears relation sets that are not resupplied.
#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub title: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
}

/// Payload for partial (PATCH) updates; absent fields are left untouched
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub duration_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

/// Query parameters for recipe listing
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids
    pub tags: Option<String>,
    /// Comma-separated ingredient ids
    pub ingredients: Option<String>,
}

/// List representation: related records as bare ids
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

impl RecipeSummary {
    pub fn new(recipe: Recipe, tags: Vec<Uuid>, ingredients: Vec<Uuid>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            duration_minutes: recipe.duration_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image,
            tags,
            ingredients,
        }
    }
}

/// Detail representation: related records expanded to nested objects
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientResponse>,
}

impl RecipeDetail {
    pub fn new(recipe: Recipe, tags: Vec<Tag>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            duration_minutes: recipe.duration_minutes,
            price: recipe.price,
            link: recipe.link,
            image: recipe.image,
            tags: tags.into_iter().map(TagResponse::from).collect(),
            ingredients: ingredients.into_iter().map(IngredientResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_numeric_and_string_prices() {
        let from_number: CreateRecipeRequest =
            serde_json::from_str(r#"{"title":"Stew","duration_minutes":30,"price":7.5}"#)
                .expect("numeric price");
        assert_eq!(from_number.title, "Stew");
        assert_eq!(from_number.duration_minutes, 30);

        let from_string: CreateRecipeRequest =
            serde_json::from_str(r#"{"title":"Stew","duration_minutes":30,"price":"7.50"}"#)
                .expect("string price");
        assert_eq!(from_string.price.to_string(), "7.50");
    }

    #[test]
    fn create_request_defaults_relations_to_empty() {
        let req: CreateRecipeRequest =
            serde_json::from_str(r#"{"title":"Stew","duration_minutes":30,"price":"7.50"}"#)
                .unwrap();
        assert!(req.tags.is_empty());
        assert!(req.ingredients.is_empty());
        assert!(req.link.is_none());
    }

    #[test]
    fn update_request_distinguishes_absent_fields() {
        let req: UpdateRecipeRequest =
            serde_json::from_str(r#"{"title":"Chicken tikka"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("Chicken tikka"));
        assert!(req.duration_minutes.is_none());
        assert!(req.tags.is_none());
        assert!(req.ingredients.is_none());
    }

    #[test]
    fn missing_required_create_fields_fail() {
        let result: Result<CreateRecipeRequest, _> =
            serde_json::from_str(r#"{"title":"Stew"}"#);
        assert!(result.is_err());
    }
}
